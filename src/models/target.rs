use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use surrealdb::sql::Thing;

use crate::{helpers::thing_helpers::create_thing, Error, Result};

/// Kinds of entity a comment or a favorite can be attached to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetKind {
    Song,
    Album,
    Songlist,
}

impl TargetKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "song" => Ok(TargetKind::Song),
            "album" => Ok(TargetKind::Album),
            "songlist" => Ok(TargetKind::Songlist),
            _ => Err(Error::invalid(format!("invalid target type: {raw}"))),
        }
    }

    /// Table holding the entities of this kind.
    pub fn table(&self) -> &'static str {
        match self {
            TargetKind::Song => "song",
            TargetKind::Album => "album",
            TargetKind::Songlist => "songlist",
        }
    }

    /// Edge table recording `user -> target` favorites.
    pub fn favorite_table(&self) -> &'static str {
        match self {
            TargetKind::Song => "user_likes_song",
            TargetKind::Album => "user_likes_album",
            TargetKind::Songlist => "user_likes_songlist",
        }
    }

    pub fn label_field(&self) -> &'static str {
        "title"
    }
}

/// A `(kind, id)` pair naming the entity a comment or favorite applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: TargetKind,
    pub id: String,
}

impl Target {
    /// Builds a target from raw request fields, both of which are required.
    pub fn from_request(kind: Option<&str>, id: Option<&str>) -> Result<Self> {
        let kind = kind
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::invalid("missing parameter: target_type"))?;
        let id = id
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .ok_or_else(|| Error::invalid("missing parameter: target_id"))?;

        Ok(Self {
            kind: TargetKind::parse(kind)?,
            id: id.to_string(),
        })
    }

    pub fn thing(&self) -> Thing {
        create_thing(self.kind.table(), &self.id)
    }
}

/// Kinds of entity whose play totals can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayScope {
    Song,
    Album,
    Singer,
}

impl PlayScope {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "song" => Ok(PlayScope::Song),
            "album" => Ok(PlayScope::Album),
            "singer" => Ok(PlayScope::Singer),
            _ => Err(Error::invalid(format!("invalid play statistics type: {raw}"))),
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            PlayScope::Song => "song",
            PlayScope::Album => "album",
            PlayScope::Singer => "singer",
        }
    }

    pub fn label_field(&self) -> &'static str {
        match self {
            PlayScope::Singer => "name",
            _ => "title",
        }
    }
}
