// Torchly — Morse Encoding & Sequence Plans
//
// Maps text to an ordered list of light pulses and dark gaps.  All durations
// are expressed in abstract units; the sequencer scales them by the base unit
// (200 ms by default, so dot = 200 ms and dash = 600 ms).

// ---------------------------------------------------------------------------
// Plan elements
// ---------------------------------------------------------------------------

/// A light pulse: dot (1 unit) or dash (3 units).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseUnit {
    Short,
    Long,
}

impl PulseUnit {
    pub fn units(&self) -> u32 {
        match self {
            Self::Short => 1,
            Self::Long => 3,
        }
    }
}

/// A dark pause between pulses, letters, or words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapUnit {
    /// 1 unit — between the pulses of one letter.
    IntraSymbol,
    /// 3 units — trailing pause after a letter's pulses.
    InterLetter,
    /// 7 units — pause for a space between words.
    InterWord,
}

impl GapUnit {
    pub fn units(&self) -> u32 {
        match self {
            Self::IntraSymbol => 1,
            Self::InterLetter => 3,
            Self::InterWord => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Pulse(PulseUnit),
    Gap(GapUnit),
}

impl Element {
    pub fn units(&self) -> u32 {
        match self {
            Self::Pulse(p) => p.units(),
            Self::Gap(g) => g.units(),
        }
    }

    /// Wall-clock duration of this element at the given base unit.
    pub fn duration_ms(&self, unit_ms: u64) -> u64 {
        self.units() as u64 * unit_ms
    }
}

// ---------------------------------------------------------------------------
// Sequence plan
// ---------------------------------------------------------------------------

/// An ordered, restartable list of pulse/gap instructions.  Plans carry no
/// playback state; running one twice produces identical light output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePlan {
    elements: Vec<Element>,
}

impl SequencePlan {
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn total_units(&self) -> u32 {
        self.elements.iter().map(Element::units).sum()
    }

    /// Duration of a single pass through the plan (loop pauses excluded).
    pub fn total_duration_ms(&self, unit_ms: u64) -> u64 {
        self.total_units() as u64 * unit_ms
    }
}

// ---------------------------------------------------------------------------
// Code table (ITU letters and digits)
// ---------------------------------------------------------------------------

fn symbol(c: char) -> Option<&'static str> {
    let code = match c {
        'A' => ".-",
        'B' => "-...",
        'C' => "-.-.",
        'D' => "-..",
        'E' => ".",
        'F' => "..-.",
        'G' => "--.",
        'H' => "....",
        'I' => "..",
        'J' => ".---",
        'K' => "-.-",
        'L' => ".-..",
        'M' => "--",
        'N' => "-.",
        'O' => "---",
        'P' => ".--.",
        'Q' => "--.-",
        'R' => ".-.",
        'S' => "...",
        'T' => "-",
        'U' => "..-",
        'V' => "...-",
        'W' => ".--",
        'X' => "-..-",
        'Y' => "-.--",
        'Z' => "--..",
        '0' => "-----",
        '1' => ".----",
        '2' => "..---",
        '3' => "...--",
        '4' => "....-",
        '5' => ".....",
        '6' => "-....",
        '7' => "--...",
        '8' => "---..",
        '9' => "----.",
        _ => return None,
    };
    Some(code)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode text into a blinkable plan.
///
/// Input is uppercased first.  A space emits an inter-word gap; characters
/// outside A–Z/0–9 are dropped without contributing pulses or gaps.  Every
/// pulse is followed by an intra-symbol gap, and each letter is closed with
/// an inter-letter pause, so between two letters the light stays dark for
/// 1 + 3 units.
pub fn encode(text: &str) -> SequencePlan {
    let mut elements = Vec::new();

    for c in text.to_uppercase().chars() {
        if c == ' ' {
            elements.push(Element::Gap(GapUnit::InterWord));
            continue;
        }
        let Some(code) = symbol(c) else {
            continue;
        };
        for mark in code.chars() {
            let pulse = match mark {
                '.' => PulseUnit::Short,
                _ => PulseUnit::Long,
            };
            elements.push(Element::Pulse(pulse));
            elements.push(Element::Gap(GapUnit::IntraSymbol));
        }
        elements.push(Element::Gap(GapUnit::InterLetter));
    }

    SequencePlan { elements }
}

/// The fixed SOS distress plan: ··· ––– ···
///
/// Matches the hand-rolled pattern rather than `encode("SOS")`: the final S
/// carries no trailing gaps, because the sequencer's loop mode appends the
/// 7-unit repeat pause itself.
pub fn sos() -> SequencePlan {
    use Element::{Gap, Pulse};
    use GapUnit::{InterLetter, IntraSymbol};
    use PulseUnit::{Long, Short};

    SequencePlan {
        elements: vec![
            Pulse(Short), Gap(IntraSymbol), Pulse(Short), Gap(IntraSymbol), Pulse(Short),
            Gap(InterLetter),
            Pulse(Long), Gap(IntraSymbol), Pulse(Long), Gap(IntraSymbol), Pulse(Long),
            Gap(InterLetter),
            Pulse(Short), Gap(IntraSymbol), Pulse(Short), Gap(IntraSymbol), Pulse(Short),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulses(plan: &SequencePlan) -> Vec<PulseUnit> {
        plan.elements()
            .iter()
            .filter_map(|e| match e {
                Element::Pulse(p) => Some(*p),
                Element::Gap(_) => None,
            })
            .collect()
    }

    #[test]
    fn encode_is_deterministic() {
        assert_eq!(encode("HELLO 123"), encode("HELLO 123"));
    }

    #[test]
    fn encode_is_case_insensitive() {
        assert_eq!(encode("sos"), encode("SOS"));
    }

    #[test]
    fn unmapped_characters_are_dropped() {
        assert_eq!(encode("a!?b"), encode("ab"));
        assert!(encode("!?#").is_empty());
    }

    #[test]
    fn space_becomes_inter_word_gap() {
        let plan = encode(" ");
        assert_eq!(plan.elements(), &[Element::Gap(GapUnit::InterWord)]);
    }

    #[test]
    fn single_letter_layout() {
        // E = one dot, closed by intra gap + letter pause.
        let plan = encode("E");
        assert_eq!(
            plan.elements(),
            &[
                Element::Pulse(PulseUnit::Short),
                Element::Gap(GapUnit::IntraSymbol),
                Element::Gap(GapUnit::InterLetter),
            ]
        );
    }

    #[test]
    fn sos_pulse_pattern() {
        use PulseUnit::{Long, Short};
        let expected = vec![Short, Short, Short, Long, Long, Long, Short, Short, Short];
        assert_eq!(pulses(&encode("SOS")), expected);
        assert_eq!(pulses(&sos()), expected);
    }

    #[test]
    fn sos_plan_single_pass_duration() {
        // S burst = 5 units, O burst = 11, letter pauses 3 each: 5+3+11+3+5 = 27.
        let plan = sos();
        assert_eq!(plan.total_units(), 27);
        assert_eq!(plan.total_duration_ms(200), 5400);
    }

    #[test]
    fn dot_dash_gap_constants_at_default_unit() {
        assert_eq!(Element::Pulse(PulseUnit::Short).duration_ms(200), 200);
        assert_eq!(Element::Pulse(PulseUnit::Long).duration_ms(200), 600);
        assert_eq!(Element::Gap(GapUnit::IntraSymbol).duration_ms(200), 200);
        assert_eq!(Element::Gap(GapUnit::InterLetter).duration_ms(200), 600);
        assert_eq!(Element::Gap(GapUnit::InterWord).duration_ms(200), 1400);
    }

    #[test]
    fn every_mapped_character_has_pulses() {
        for c in ('A'..='Z').chain('0'..='9') {
            let plan = encode(&c.to_string());
            assert!(!pulses(&plan).is_empty(), "no pulses for {c}");
        }
    }
}
