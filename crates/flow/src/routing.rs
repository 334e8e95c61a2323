//! Welcome-menu routing as an explicit decision table
//!
//! Intent digits: 1 immediate, 2 reservation, 3 operator, 9 language
//! toggle. The exchange's self-service mode can veto immediate or
//! reservation handling, in which case the caller lands at the operator no
//! matter what they pressed.

use taxi_agent_config::AutoServeMode;

/// What the caller pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Immediate,
    Reservation,
    Operator,
    ToggleLanguage,
    /// Empty read: timeout with no input
    Timeout,
    /// Anything else
    Unknown,
}

impl Intent {
    pub fn from_digits(digits: &str) -> Self {
        match digits.trim() {
            "1" => Intent::Immediate,
            "2" => Intent::Reservation,
            "3" => Intent::Operator,
            "9" => Intent::ToggleLanguage,
            "" => Intent::Timeout,
            _ => Intent::Unknown,
        }
    }
}

/// The routing verdict for one menu read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Immediate,
    Reservation,
    Operator,
    ToggleLanguage,
    /// Re-prompt, consuming one retry
    Reprompt,
}

/// The full intent-by-policy table
pub fn route(intent: Intent, mode: AutoServeMode) -> RouteAction {
    match intent {
        Intent::ToggleLanguage => RouteAction::ToggleLanguage,
        Intent::Operator => RouteAction::Operator,
        Intent::Timeout | Intent::Unknown => RouteAction::Reprompt,
        Intent::Immediate => match mode {
            AutoServeMode::All | AutoServeMode::ImmediateOnly => RouteAction::Immediate,
            AutoServeMode::ReservationOnly | AutoServeMode::None => RouteAction::Operator,
        },
        Intent::Reservation => match mode {
            AutoServeMode::All | AutoServeMode::ReservationOnly => RouteAction::Reservation,
            AutoServeMode::ImmediateOnly | AutoServeMode::None => RouteAction::Operator,
        },
    }
}

/// Foreign-number screen, applied only when the exchange enables it.
/// Long numbers that carry none of the allowed country prefixes are routed
/// to the operator; everything else proceeds normally.
pub fn is_foreign_number(number: &str) -> bool {
    const ALLOWED_PREFIXES: &[&str] = &["+30", "0030", "+359"];
    let digits: String = number
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if digits.chars().filter(|c| c.is_ascii_digit()).count() <= 10 {
        return false;
    }
    !ALLOWED_PREFIXES.iter().any(|p| digits.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_map() {
        assert_eq!(Intent::from_digits("1"), Intent::Immediate);
        assert_eq!(Intent::from_digits("2"), Intent::Reservation);
        assert_eq!(Intent::from_digits("3"), Intent::Operator);
        assert_eq!(Intent::from_digits("9"), Intent::ToggleLanguage);
        assert_eq!(Intent::from_digits(""), Intent::Timeout);
        assert_eq!(Intent::from_digits("7"), Intent::Unknown);
    }

    #[test]
    fn full_decision_table() {
        use AutoServeMode as Mode;
        let cases = [
            (Intent::Immediate, Mode::All, RouteAction::Immediate),
            (Intent::Immediate, Mode::ImmediateOnly, RouteAction::Immediate),
            (Intent::Immediate, Mode::ReservationOnly, RouteAction::Operator),
            (Intent::Immediate, Mode::None, RouteAction::Operator),
            (Intent::Reservation, Mode::All, RouteAction::Reservation),
            (Intent::Reservation, Mode::ImmediateOnly, RouteAction::Operator),
            (Intent::Reservation, Mode::ReservationOnly, RouteAction::Reservation),
            (Intent::Reservation, Mode::None, RouteAction::Operator),
            (Intent::Operator, Mode::All, RouteAction::Operator),
            (Intent::Operator, Mode::None, RouteAction::Operator),
            (Intent::ToggleLanguage, Mode::None, RouteAction::ToggleLanguage),
            (Intent::Timeout, Mode::All, RouteAction::Reprompt),
            (Intent::Unknown, Mode::All, RouteAction::Reprompt),
        ];
        for (intent, mode, expected) in cases {
            assert_eq!(route(intent, mode), expected, "{intent:?} x {mode:?}");
        }
    }

    #[test]
    fn foreign_screen_allows_domestic_and_short_numbers() {
        assert!(!is_foreign_number("+306912345678"));
        assert!(!is_foreign_number("00306912345678"));
        assert!(!is_foreign_number("6912345678"));
        assert!(!is_foreign_number("2104115200"));
    }

    #[test]
    fn foreign_screen_blocks_long_unprefixed_numbers() {
        assert!(is_foreign_number("+4917612345678"));
        assert!(is_foreign_number("004412345678901"));
        assert!(!is_foreign_number("+35912345678901"));
    }
}
