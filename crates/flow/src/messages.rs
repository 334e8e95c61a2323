//! Prompt catalogue and spoken-text templates
//!
//! Static prompts are pre-recorded files under the exchange sound root,
//! one subdirectory per language. Anything with dynamic content (the
//! confirmation summary, time disambiguation, driver announcements) is
//! synthesized per call.

use taxi_agent_core::Language;
use taxi_agent_dispatch::{DriverStatus, StatusArtifact};

/// Pre-recorded prompt files, extensionless as playback wants them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Welcome,
    Menu,
    AskName,
    AskPickup,
    AskDestination,
    AskReservationTime,
    NotUnderstood,
    Invalid,
    AnonymousBlocked,
    Blocked,
    TransferOperator,
    PleaseWait,
    Goodbye,
}

impl Prompt {
    fn file(&self) -> &'static str {
        match self {
            Prompt::Welcome => "welcome",
            Prompt::Menu => "menu",
            Prompt::AskName => "ask_name",
            Prompt::AskPickup => "ask_pickup",
            Prompt::AskDestination => "ask_destination",
            Prompt::AskReservationTime => "ask_reservation_time",
            Prompt::NotUnderstood => "not_understood",
            Prompt::Invalid => "invalid_input",
            Prompt::AnonymousBlocked => "anonymous_blocked",
            Prompt::Blocked => "user_blocked",
            Prompt::TransferOperator => "transfer_operator",
            Prompt::PleaseWait => "please_wait",
            Prompt::Goodbye => "goodbye",
        }
    }
}

/// Resolves prompt files under the exchange sound root
#[derive(Debug, Clone)]
pub struct Prompts {
    sound_root: String,
}

impl Prompts {
    pub fn new(sound_root: impl Into<String>) -> Self {
        Self {
            sound_root: sound_root.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn path(&self, language: Language, prompt: Prompt) -> String {
        format!("{}/{}/{}", self.sound_root, language.sound_dir(), prompt.file())
    }
}

/// Confirmation summary spoken before registration
pub fn summary_text(
    language: Language,
    name: Option<&str>,
    pickup: &str,
    destination: &str,
    reservation: Option<&str>,
) -> String {
    match language {
        Language::Greek => {
            let mut text = String::new();
            if let Some(name) = name {
                text.push_str(&format!("{}, ", name));
            }
            text.push_str(&format!(
                "παραλαβή από {}, προορισμός {}",
                pickup, destination
            ));
            if let Some(when) = reservation {
                text.push_str(&format!(", για {}", when));
            }
            text.push_str(
                ". Πατήστε 0 για επιβεβαίωση, 1 για το όνομα, 2 για τη διεύθυνση παραλαβής, 3 για τον προορισμό",
            );
            if reservation.is_some() {
                text.push_str(", 4 για την ώρα");
            }
            text.push('.');
            text
        }
        Language::English => {
            let mut text = String::new();
            if let Some(name) = name {
                text.push_str(&format!("{}, ", name));
            }
            text.push_str(&format!("pickup from {}, destination {}", pickup, destination));
            if let Some(when) = reservation {
                text.push_str(&format!(", for {}", when));
            }
            text.push_str(
                ". Press 0 to confirm, 1 for the name, 2 for the pickup address, 3 for the destination",
            );
            if reservation.is_some() {
                text.push_str(", 4 for the time");
            }
            text.push('.');
            text
        }
    }
}

/// Spoken confirmation of a single recognized reservation time
pub fn time_confirm_text(language: Language, when: &str) -> String {
    match language {
        Language::Greek => format!(
            "Θέλετε ταξί για {}; Πατήστε 0 για επιβεβαίωση, οποιοδήποτε άλλο πλήκτρο για να ξαναπείτε την ώρα.",
            when
        ),
        Language::English => format!(
            "You want a taxi for {}? Press 0 to confirm, any other key to say the time again.",
            when
        ),
    }
}

/// Two-way disambiguation between reservation time readings
pub fn time_choice_text(language: Language, first: &str, second: &str) -> String {
    match language {
        Language::Greek => format!(
            "Πατήστε 1 για {}, ή 2 για {}.",
            first, second
        ),
        Language::English => format!("Press 1 for {}, or 2 for {}.", first, second),
    }
}

/// Saved-pickup offer for recognized callers
pub fn saved_pickup_text(language: Language, name: Option<&str>, address: &str) -> String {
    match language {
        Language::Greek => {
            let greeting = match name {
                Some(name) => format!("Γεια σας {}. ", name),
                None => String::new(),
            };
            format!(
                "{}Θέλετε παραλαβή από {}; Πατήστε 0 για ναι, οποιοδήποτε άλλο πλήκτρο για άλλη διεύθυνση.",
                greeting, address
            )
        }
        Language::English => {
            let greeting = match name {
                Some(name) => format!("Hello {}. ", name),
                None => String::new(),
            };
            format!(
                "{}Do you want pickup from {}? Press 0 for yes, any other key for a different address.",
                greeting, address
            )
        }
    }
}

/// Driver status announcement in callback mode
pub fn driver_update_text(language: Language, artifact: &StatusArtifact) -> String {
    let status = artifact.driver_status();
    let car = artifact.car_no.as_deref();
    match language {
        Language::Greek => match (status, car) {
            (DriverStatus::Accepted, Some(car)) => match artifact.eta {
                Some(eta) => format!(
                    "Το ταξί {} δέχτηκε την κλήση σας και θα είναι κοντά σας σε {} λεπτά.",
                    car, eta
                ),
                None => format!("Το ταξί {} δέχτηκε την κλήση σας.", car),
            },
            (DriverStatus::Accepted, None) => "Ένα ταξί δέχτηκε την κλήση σας.".to_string(),
            (DriverStatus::EnRoute, Some(car)) => {
                format!("Το ταξί {} είναι καθ' οδόν.", car)
            }
            (DriverStatus::Arrived, Some(car)) => {
                format!("Το ταξί {} έφτασε στη διεύθυνσή σας.", car)
            }
            _ => "Η κλήση σας ενημερώθηκε.".to_string(),
        },
        Language::English => match (status, car) {
            (DriverStatus::Accepted, Some(car)) => match artifact.eta {
                Some(eta) => format!(
                    "Taxi {} accepted your booking and will arrive in about {} minutes.",
                    car, eta
                ),
                None => format!("Taxi {} accepted your booking.", car),
            },
            (DriverStatus::Accepted, None) => "A taxi accepted your booking.".to_string(),
            (DriverStatus::EnRoute, Some(car)) => format!("Taxi {} is on its way.", car),
            (DriverStatus::Arrived, Some(car)) => format!("Taxi {} has arrived.", car),
            _ => "Your booking was updated.".to_string(),
        },
    }
}

/// Announcement when the trip was cancelled after acceptance
pub fn cancelled_text(language: Language) -> String {
    match language {
        Language::Greek => "Η διαδρομή σας ακυρώθηκε.".to_string(),
        Language::English => "Your trip was cancelled.".to_string(),
    }
}

/// Apology when dispatch finds no taxi
pub fn no_taxi_text(language: Language) -> String {
    match language {
        Language::Greek => {
            "Λυπούμαστε, δεν βρέθηκε διαθέσιμο ταξί. Σας συνδέουμε με εκπρόσωπο.".to_string()
        }
        Language::English => {
            "We are sorry, no taxi was found. Connecting you to an operator.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_paths_follow_language_dirs() {
        let prompts = Prompts::new("/var/sounds/agent/");
        assert_eq!(
            prompts.path(Language::Greek, Prompt::Welcome),
            "/var/sounds/agent/el/welcome"
        );
        assert_eq!(
            prompts.path(Language::English, Prompt::Menu),
            "/var/sounds/agent/en/menu"
        );
    }

    #[test]
    fn summary_mentions_every_collected_field() {
        let text = summary_text(
            Language::Greek,
            Some("Μαρία"),
            "Ερμού 10",
            "Συγγρού 150",
            Some("αύριο στις 9"),
        );
        assert!(text.contains("Μαρία"));
        assert!(text.contains("Ερμού 10"));
        assert!(text.contains("Συγγρού 150"));
        assert!(text.contains("αύριο στις 9"));
        assert!(text.contains("4 για την ώρα"));
    }

    #[test]
    fn immediate_summary_skips_the_time_digit() {
        let text = summary_text(Language::English, None, "A", "B", None);
        assert!(!text.contains("4 for the time"));
    }

    #[test]
    fn accepted_announcement_names_the_car() {
        let artifact = StatusArtifact {
            status: 10,
            car_no: Some("TAXI-42".into()),
            eta: Some(5),
            trip_id: None,
        };
        let text = driver_update_text(Language::Greek, &artifact);
        assert!(text.contains("TAXI-42"));
        assert!(text.contains("5"));
    }
}
