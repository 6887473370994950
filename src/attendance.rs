/// Fixed status-to-score mapping applied when recording attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceMark {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceMark {
    pub fn from_normalized(status: &str) -> Option<Self> {
        match status {
            "Present" => Some(AttendanceMark::Present),
            "Absent" => Some(AttendanceMark::Absent),
            "Late" => Some(AttendanceMark::Late),
            "Excused" => Some(AttendanceMark::Excused),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceMark::Present => "Present",
            AttendanceMark::Absent => "Absent",
            AttendanceMark::Late => "Late",
            AttendanceMark::Excused => "Excused",
        }
    }

    pub fn score(self) -> f64 {
        match self {
            AttendanceMark::Present => 10.0,
            AttendanceMark::Absent => 0.0,
            AttendanceMark::Late => 7.0,
            AttendanceMark::Excused => 5.0,
        }
    }
}

/// Trims, lower-cases, then upper-cases the first letter of every
/// whitespace-delimited word. Inner whitespace is kept as-is.
pub fn normalize_status(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for c in raw.trim().chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
            continue;
        }
        if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
