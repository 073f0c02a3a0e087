use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::giveaway::models::GiveawayField;

lazy_static! {
    static ref ACTION_REGEX: Regex = Regex::new(
        r"^(?:edit_(?P<field>[a-z]+)|(?P<action>start|join|reroll))_(?P<id>[^_\s]+)(?:_(?P<index>\d+))?$"
    )
    .unwrap();
}

/// Everything a user can press on a giveaway panel. The component custom id
/// gets decoded into one of these exactly once, when the interaction arrives.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PanelAction {
    Edit { id: String, field: GiveawayField },
    Start { id: String },
    Join { id: String },
    Reroll { id: String, winner_index: usize },
}

impl PanelAction {
    // Returns the id of the giveaway the panel belongs to.
    pub fn giveaway_id(&self) -> &str {
        match self {
            PanelAction::Edit { id, .. }
            | PanelAction::Start { id }
            | PanelAction::Join { id }
            | PanelAction::Reroll { id, .. } => id,
        }
    }

    // Actions reserved to the operators managing the giveaway.
    pub fn requires_operator(&self) -> bool {
        !matches!(self, PanelAction::Join { .. })
    }

    // Encodes the action as a component custom id.
    pub fn custom_id(&self) -> String {
        match self {
            PanelAction::Edit { id, field } => format!("edit_{}_{}", field.as_str(), id),
            PanelAction::Start { id } => format!("start_{}", id),
            PanelAction::Join { id } => format!("join_{}", id),
            PanelAction::Reroll { id, winner_index } => format!("reroll_{}_{}", id, winner_index),
        }
    }

    pub fn parse(custom_id: &str) -> Result<Self> {
        let unknown = || Error::InvalidInput(format!("Unknown panel action `{}`.", custom_id));

        let captures = ACTION_REGEX.captures(custom_id).ok_or_else(unknown)?;
        let id = match captures.name("id") {
            Some(id) => id.as_str().to_string(),
            None => return Err(unknown()),
        };
        let index = match captures.name("index") {
            Some(index) => Some(index.as_str().parse::<usize>().map_err(|_| unknown())?),
            None => None,
        };

        if let Some(field) = captures.name("field") {
            if index.is_some() {
                return Err(unknown());
            }
            let field = GiveawayField::from_str(field.as_str()).map_err(|_| unknown())?;
            return Ok(PanelAction::Edit { id, field });
        }

        match (captures.name("action").map(|action| action.as_str()), index) {
            (Some("start"), None) => Ok(PanelAction::Start { id }),
            (Some("join"), None) => Ok(PanelAction::Join { id }),
            (Some("reroll"), Some(winner_index)) => Ok(PanelAction::Reroll { id, winner_index }),
            _ => Err(unknown()),
        }
    }
}

impl FromStr for PanelAction {
    type Err = Error;

    fn from_str(custom_id: &str) -> Result<Self> {
        PanelAction::parse(custom_id)
    }
}

impl fmt::Display for PanelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.custom_id())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::giveaway::models::GiveawayField;
    use crate::giveaway::parser::PanelAction;

    #[test]
    fn test_parse_edit_actions() {
        let action = PanelAction::parse("edit_title_1234").unwrap();

        assert_eq!(
            action,
            PanelAction::Edit {
                id: "1234".to_string(),
                field: GiveawayField::Title
            }
        );
        assert_eq!(action.giveaway_id(), "1234");
        assert_eq!(action.requires_operator(), true);
    }

    #[test]
    fn test_parse_edit_date_and_winners() {
        assert_eq!(
            PanelAction::parse("edit_date_9").unwrap(),
            PanelAction::Edit {
                id: "9".to_string(),
                field: GiveawayField::DurationDays
            }
        );
        assert_eq!(
            PanelAction::parse("edit_winners_9").unwrap(),
            PanelAction::Edit {
                id: "9".to_string(),
                field: GiveawayField::WinnersCount
            }
        );
    }

    #[test]
    fn test_parse_start_and_join() {
        assert_eq!(
            PanelAction::parse("start_55").unwrap(),
            PanelAction::Start {
                id: "55".to_string()
            }
        );

        let join = PanelAction::parse("join_55").unwrap();
        assert_eq!(
            join,
            PanelAction::Join {
                id: "55".to_string()
            }
        );
        assert_eq!(join.requires_operator(), false);
    }

    #[test]
    fn test_parse_reroll_with_index() {
        assert_eq!(
            PanelAction::parse("reroll_55_2").unwrap(),
            PanelAction::Reroll {
                id: "55".to_string(),
                winner_index: 2
            }
        );
    }

    #[test]
    fn test_custom_id_is_parsed_back() {
        let actions = vec![
            PanelAction::Edit {
                id: "1".to_string(),
                field: GiveawayField::ImageUrl,
            },
            PanelAction::Start {
                id: "1".to_string(),
            },
            PanelAction::Reroll {
                id: "1".to_string(),
                winner_index: 0,
            },
        ];

        for action in actions {
            assert_eq!(PanelAction::parse(&action.custom_id()).unwrap(), action);
        }
    }

    #[test]
    fn test_get_error_for_unknown_actions() {
        for custom_id in [
            "",
            "start",
            "reroll_55",
            "join_55_1",
            "edit_colour_55",
            "edit_title_55_1",
            "delete_55",
        ] {
            let result = PanelAction::parse(custom_id);
            assert_eq!(
                result.unwrap_err(),
                Error::InvalidInput(format!("Unknown panel action `{}`.", custom_id))
            );
        }
    }
}
