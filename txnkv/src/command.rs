/// A parsed client command. The verb is case-insensitive; keys and
/// values are taken verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `PUT <key> <value>`
    Put {
        /// Key to write.
        key: String,
        /// Value to associate with the key.
        value: String,
    },
    /// `GET <key>`
    Get {
        /// Key to read.
        key: String,
    },
    /// `DELETE <key>`
    Delete {
        /// Key to remove.
        key: String,
    },
}

impl Command {
    /// Parse a command line; `None` for anything outside the grammar.
    pub fn parse(input: &str) -> Option<Command> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        match parts.first()?.to_uppercase().as_str() {
            "PUT" if parts.len() == 3 => Some(Command::Put {
                key: parts[1].to_string(),
                value: parts[2].to_string(),
            }),
            "GET" if parts.len() == 2 => Some(Command::Get {
                key: parts[1].to_string(),
            }),
            "DELETE" if parts.len() == 2 => Some(Command::Delete {
                key: parts[1].to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_verbs() {
        assert_eq!(
            Command::parse("PUT Usa Nyc"),
            Some(Command::Put {
                key: "Usa".into(),
                value: "Nyc".into()
            })
        );
        assert_eq!(
            Command::parse("GET Usa"),
            Some(Command::Get { key: "Usa".into() })
        );
        assert_eq!(
            Command::parse("DELETE Usa"),
            Some(Command::Delete { key: "Usa".into() })
        );
    }

    #[test]
    fn verb_is_case_insensitive() {
        assert_eq!(
            Command::parse("put Usa Nyc"),
            Some(Command::Put {
                key: "Usa".into(),
                value: "Nyc".into()
            })
        );
        assert_eq!(
            Command::parse("dElEtE Usa"),
            Some(Command::Delete { key: "Usa".into() })
        );
    }

    #[test]
    fn keys_and_values_keep_their_case() {
        assert_eq!(
            Command::parse("PUT Key VALUE"),
            Some(Command::Put {
                key: "Key".into(),
                value: "VALUE".into()
            })
        );
    }

    #[test]
    fn rejects_unknown_verbs_and_bad_arity() {
        assert_eq!(Command::parse("FLY Usa"), None);
        assert_eq!(Command::parse("PUT Usa"), None);
        assert_eq!(Command::parse("PUT Usa Nyc extra"), None);
        assert_eq!(Command::parse("GET"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn tolerates_extra_whitespace() {
        assert_eq!(
            Command::parse("  GET   Usa "),
            Some(Command::Get { key: "Usa".into() })
        );
    }
}
