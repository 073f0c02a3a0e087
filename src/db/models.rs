use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};

use crate::giveaway::models::Giveaway;

/// The whole persisted document: every giveaway keyed by the id of the
/// message hosting its panel.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct GiveawayDocument {
    pub giveaways: BTreeMap<String, Giveaway>,
}

impl GiveawayDocument {
    pub fn new() -> Self {
        GiveawayDocument::default()
    }
}
