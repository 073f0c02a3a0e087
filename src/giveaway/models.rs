use std::collections::BTreeSet;
use std::fmt;
use std::result;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, Deserializer};
use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const SECONDS_PER_DAY: i64 = 86_400;

pub const DEFAULT_TITLE: &str = "New giveaway";
pub const DEFAULT_RULES: &str = "1 - Join the server\n2 - Press the join button";
pub const DEFAULT_PRIZE: &str = "A surprise prize";
pub const DEFAULT_IMAGE_URL: &str = "https://i.imgur.com/joSz2Qb.png";
pub const DEFAULT_DURATION_DAYS: u32 = 5;
pub const DEFAULT_WINNERS_COUNT: u32 = 1;

lazy_static! {
    static ref MENTION_REGEX: Regex = Regex::new(r"^<@!?(?P<id>\d+)>$").unwrap();
}

// Older documents stored snowflakes either as numbers or as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnowflake {
    Number(u64),
    Text(String),
}

fn deserialize_snowflake<'de, D>(deserializer: D) -> result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match <RawSnowflake as serde::Deserialize>::deserialize(deserializer)? {
        RawSnowflake::Number(value) => Ok(value),
        RawSnowflake::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("`{}` is not a valid snowflake", text))),
    }
}

/// A chat user, always stored as the integral snowflake.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub fn new(value: u64) -> Self {
        UserId(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    // Text that pings the user in a chat message.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        UserId(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = Error;

    // Accepts a bare snowflake or a `<@id>` / `<@!id>` mention.
    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        let digits = match MENTION_REGEX.captures(text) {
            Some(captures) => captures.name("id").map_or(text, |id| id.as_str()),
            None => text,
        };

        digits
            .parse::<u64>()
            .map(UserId)
            .map_err(|_| Error::InvalidInput(format!("`{}` is not a valid user id.", text)))
    }
}

impl<'de> serde::Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_snowflake(deserializer).map(UserId)
    }
}

/// The channel hosting the giveaway panel.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChannelId(u64);

impl ChannelId {
    pub fn new(value: u64) -> Self {
        ChannelId(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ChannelId {
    fn from(value: u64) -> Self {
        ChannelId(value)
    }
}

impl<'de> serde::Deserialize<'de> for ChannelId {
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_snowflake(deserializer).map(ChannelId)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiveawayStatus {
    // Being configured by an operator, nobody can join yet.
    Setup,
    // Accepting participants until the deadline.
    Running,
    // Winners drawn (or the panel was abandoned). Terminal.
    Ended,
}

impl GiveawayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiveawayStatus::Setup => "setup",
            GiveawayStatus::Running => "running",
            GiveawayStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for GiveawayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields an operator may change while the giveaway is in setup.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GiveawayField {
    Title,
    Rules,
    Prize,
    ImageUrl,
    DurationDays,
    WinnersCount,
}

impl GiveawayField {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiveawayField::Title => "title",
            GiveawayField::Rules => "rules",
            GiveawayField::Prize => "prize",
            GiveawayField::ImageUrl => "image",
            GiveawayField::DurationDays => "date",
            GiveawayField::WinnersCount => "winners",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, GiveawayField::DurationDays | GiveawayField::WinnersCount)
    }
}

impl FromStr for GiveawayField {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        match text {
            "title" => Ok(GiveawayField::Title),
            "rules" => Ok(GiveawayField::Rules),
            "prize" => Ok(GiveawayField::Prize),
            "image" | "image_url" => Ok(GiveawayField::ImageUrl),
            "date" | "duration_days" => Ok(GiveawayField::DurationDays),
            "winners" | "winners_count" => Ok(GiveawayField::WinnersCount),
            _ => Err(Error::InvalidInput(format!("Unknown giveaway field `{}`.", text))),
        }
    }
}

// Computes the absolute deadline `days` whole days after `now`.
pub fn deadline_after(now: i64, days: u32) -> Result<i64> {
    SECONDS_PER_DAY
        .checked_mul(i64::from(days))
        .and_then(|seconds| now.checked_add(seconds))
        .ok_or_else(|| Error::InvalidInput(format!("A duration of {} days is too long.", days)))
}

// Parses a positive integer typed by an operator.
pub fn parse_positive(field: GiveawayField, value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(number) if number >= 1 => Ok(number),
        _ => Err(Error::InvalidInput(format!(
            "The {} must be a whole number greater than zero.",
            field.as_str()
        ))),
    }
}

// Accepts free text as long as it isn't blank.
pub fn parse_text(field: GiveawayField, value: &str) -> Result<String> {
    match value.trim().is_empty() {
        true => Err(Error::InvalidInput(format!(
            "The {} can't be empty.",
            field.as_str()
        ))),
        false => Ok(value.to_string()),
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Giveaway {
    pub(crate) title: String,
    pub(crate) rules: String,
    pub(crate) prize: String,
    #[serde(default)]
    pub(crate) image_url: String,
    pub(crate) channel_id: ChannelId,
    pub(crate) duration_days: u32,
    pub(crate) end_timestamp: i64,
    pub(crate) winners_count: u32,
    pub(crate) status: GiveawayStatus,
    #[serde(default)]
    pub(crate) participants: BTreeSet<UserId>,
    #[serde(default)]
    pub(crate) winners: Vec<UserId>,
}

impl Giveaway {
    // Builds a fresh giveaway in the setup phase. The deadline counts from `now`
    // until the giveaway gets started.
    pub fn new(channel_id: ChannelId, options: &GiveawayOptions, now: i64) -> Result<Self> {
        let duration_days = options.duration_days.unwrap_or(DEFAULT_DURATION_DAYS);
        let winners_count = options.winners_count.unwrap_or(DEFAULT_WINNERS_COUNT);
        if duration_days < 1 {
            return Err(Error::InvalidInput(
                "The date must be a whole number greater than zero.".to_string(),
            ));
        }
        if winners_count < 1 {
            return Err(Error::InvalidInput(
                "The winners must be a whole number greater than zero.".to_string(),
            ));
        }

        let text_or_default = |field: GiveawayField, value: &Option<String>, default: &str| {
            match value {
                Some(text) => parse_text(field, text),
                None => Ok(default.to_string()),
            }
        };

        Ok(Giveaway {
            title: text_or_default(GiveawayField::Title, &options.title, DEFAULT_TITLE)?,
            rules: text_or_default(GiveawayField::Rules, &options.rules, DEFAULT_RULES)?,
            prize: text_or_default(GiveawayField::Prize, &options.prize, DEFAULT_PRIZE)?,
            image_url: options
                .image_url
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            channel_id,
            duration_days,
            end_timestamp: deadline_after(now, duration_days)?,
            winners_count,
            status: GiveawayStatus::Setup,
            participants: BTreeSet::new(),
            winners: Vec::new(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rules(&self) -> &str {
        &self.rules
    }

    pub fn prize(&self) -> &str {
        &self.prize
    }

    // Empty when the giveaway has no picture.
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    // Unix timestamp (seconds) of the automatic draw, or of the actual draw
    // once the giveaway has ended.
    pub fn end_timestamp(&self) -> i64 {
        self.end_timestamp
    }

    pub fn winners_count(&self) -> u32 {
        self.winners_count
    }

    pub fn status(&self) -> GiveawayStatus {
        self.status
    }

    pub fn participants(&self) -> &BTreeSet<UserId> {
        &self.participants
    }

    pub fn winners(&self) -> &[UserId] {
        &self.winners
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }

    // A running giveaway whose deadline has passed and is waiting for the draw.
    pub fn is_overdue(&self, now: i64) -> bool {
        self.status == GiveawayStatus::Running && self.end_timestamp <= now
    }
}

/// Overrides for the defaults applied when a giveaway gets created.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct GiveawayOptions {
    title: Option<String>,
    rules: Option<String>,
    prize: Option<String>,
    image_url: Option<String>,
    duration_days: Option<u32>,
    winners_count: Option<u32>,
}

impl GiveawayOptions {
    pub fn new() -> Self {
        GiveawayOptions::default()
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_rules(mut self, rules: &str) -> Self {
        self.rules = Some(rules.to_string());
        self
    }

    pub fn with_prize(mut self, prize: &str) -> Self {
        self.prize = Some(prize.to_string());
        self
    }

    pub fn with_image_url(mut self, image_url: &str) -> Self {
        self.image_url = Some(image_url.to_string());
        self
    }

    pub fn with_duration_days(mut self, duration_days: u32) -> Self {
        self.duration_days = Some(duration_days);
        self
    }

    pub fn with_winners_count(mut self, winners_count: u32) -> Self {
        self.winners_count = Some(winners_count);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::error::Error;
    use crate::giveaway::models::{
        deadline_after, parse_positive, parse_text, ChannelId, Giveaway, GiveawayField,
        GiveawayOptions, GiveawayStatus, UserId, DEFAULT_DURATION_DAYS, DEFAULT_TITLE,
        SECONDS_PER_DAY,
    };

    #[test]
    fn test_new_giveaway_uses_defaults() {
        let giveaway = Giveaway::new(ChannelId::new(7), &GiveawayOptions::new(), 1_000).unwrap();

        assert_eq!(giveaway.title(), DEFAULT_TITLE);
        assert_eq!(giveaway.status(), GiveawayStatus::Setup);
        assert_eq!(giveaway.duration_days(), DEFAULT_DURATION_DAYS);
        assert_eq!(giveaway.winners_count(), 1);
        assert_eq!(giveaway.end_timestamp(), 1_000 + 5 * SECONDS_PER_DAY);
        assert_eq!(giveaway.participants().is_empty(), true);
        assert_eq!(giveaway.winners().is_empty(), true);
    }

    #[test]
    fn test_new_giveaway_with_overrides() {
        let options = GiveawayOptions::new()
            .with_title("Steam key")
            .with_image_url("")
            .with_duration_days(2)
            .with_winners_count(3);
        let giveaway = Giveaway::new(ChannelId::new(7), &options, 0).unwrap();

        assert_eq!(giveaway.title(), "Steam key");
        assert_eq!(giveaway.image_url(), "");
        assert_eq!(giveaway.winners_count(), 3);
        assert_eq!(giveaway.end_timestamp(), 2 * SECONDS_PER_DAY);
    }

    #[test]
    fn test_get_error_for_zero_winners_override() {
        let options = GiveawayOptions::new().with_winners_count(0);
        let result = Giveaway::new(ChannelId::new(7), &options, 0);

        assert_eq!(result.is_err(), true);
        assert_eq!(
            result.unwrap_err(),
            Error::InvalidInput("The winners must be a whole number greater than zero.".to_string())
        );
    }

    #[test]
    fn test_get_error_for_blank_title_override() {
        let options = GiveawayOptions::new().with_title("   ");
        let result = Giveaway::new(ChannelId::new(7), &options, 0);

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidInput("The title can't be empty.".to_string())
        );
    }

    #[test]
    fn test_parse_user_id_from_snowflake_and_mentions() {
        assert_eq!(UserId::from_str("1234").unwrap(), UserId::new(1234));
        assert_eq!(UserId::from_str(" <@1234> ").unwrap(), UserId::new(1234));
        assert_eq!(UserId::from_str("<@!1234>").unwrap(), UserId::new(1234));
        assert_eq!(UserId::from_str("someone").is_err(), true);
    }

    #[test]
    fn test_user_id_mention() {
        assert_eq!(UserId::new(42).mention(), "<@42>");
    }

    #[test]
    fn test_parse_positive_values() {
        assert_eq!(parse_positive(GiveawayField::WinnersCount, " 3 ").unwrap(), 3);
        assert_eq!(parse_positive(GiveawayField::WinnersCount, "0").is_err(), true);
        assert_eq!(parse_positive(GiveawayField::WinnersCount, "-2").is_err(), true);
        assert_eq!(parse_positive(GiveawayField::DurationDays, "two").is_err(), true);
    }

    #[test]
    fn test_parse_text_keeps_value_verbatim() {
        assert_eq!(
            parse_text(GiveawayField::Rules, "  be nice\n").unwrap(),
            "  be nice\n"
        );
        assert_eq!(parse_text(GiveawayField::Rules, " \n").is_err(), true);
    }

    #[test]
    fn test_get_error_for_too_long_duration() {
        assert_eq!(deadline_after(i64::MAX - 10, 1).is_err(), true);
        assert_eq!(deadline_after(0, 1).unwrap(), SECONDS_PER_DAY);
    }

    #[test]
    fn test_parse_giveaway_field_aliases() {
        assert_eq!(GiveawayField::from_str("date").unwrap(), GiveawayField::DurationDays);
        assert_eq!(
            GiveawayField::from_str("winners_count").unwrap(),
            GiveawayField::WinnersCount
        );
        assert_eq!(GiveawayField::from_str("colour").is_err(), true);
    }

    #[test]
    fn test_deserialize_legacy_record_with_string_ids() {
        let json = r#"{
            "title": "Old",
            "rules": "none",
            "prize": "cake",
            "image_url": "",
            "channel_id": "99",
            "duration_days": 1,
            "end_timestamp": 100,
            "winners_count": 1,
            "status": "running",
            "participants": [1, "1", "2"],
            "winners": []
        }"#;
        let giveaway: Giveaway = serde_json::from_str(json).unwrap();

        assert_eq!(giveaway.channel_id(), ChannelId::new(99));
        assert_eq!(giveaway.participants().len(), 2);
        assert_eq!(giveaway.is_participant(UserId::new(1)), true);
        assert_eq!(giveaway.is_participant(UserId::new(2)), true);
    }

    #[test]
    fn test_serialize_user_ids_as_numbers() {
        let mut giveaway = Giveaway::new(ChannelId::new(7), &GiveawayOptions::new(), 0).unwrap();
        giveaway.participants.insert(UserId::new(5));
        let value = serde_json::to_value(&giveaway).unwrap();

        assert_eq!(value["participants"], serde_json::json!([5]));
        assert_eq!(value["status"], serde_json::json!("setup"));
        assert_eq!(value["channel_id"], serde_json::json!(7));
    }
}
