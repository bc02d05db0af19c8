use serde::{Deserialize, Serialize};

use super::{Livreur, User, Zone};

/// Lifecycle status of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Statut {
    Created,
    Collected,
    InStock,
    InTransit,
    Delivered,
}

impl Statut {
    pub const ALL: [Statut; 5] = [
        Statut::Created,
        Statut::Collected,
        Statut::InStock,
        Statut::InTransit,
        Statut::Delivered,
    ];

    /// Wire name, as used in query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            Statut::Created => "CREATED",
            Statut::Collected => "COLLECTED",
            Statut::InStock => "IN_STOCK",
            Statut::InTransit => "IN_TRANSIT",
            Statut::Delivered => "DELIVERED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|statut| statut.as_str().eq_ignore_ascii_case(&normalized))
    }

    /// The status that follows this one, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Statut::Created => Some(Statut::Collected),
            Statut::Collected => Some(Statut::InStock),
            Statut::InStock => Some(Statut::InTransit),
            Statut::InTransit => Some(Statut::Delivered),
            Statut::Delivered => None,
        }
    }
}

impl std::fmt::Display for Statut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery priority. `HIGHT` is the backend's spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Priority {
    #[serde(rename = "HIGHT")]
    High,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "LOW")]
    Low,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" | "HIGHT" => Some(Priority::High),
            "MEDIUM" => Some(Priority::Medium),
            "LOW" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// A relation the backend returns either expanded or as a bare id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(untagged)]
pub enum EntityRef<T> {
    Id(String),
    Expanded(T),
}

impl<T> EntityRef<T> {
    pub fn expanded(&self) -> Option<&T> {
        match self {
            EntityRef::Expanded(value) => Some(value),
            EntityRef::Id(_) => None,
        }
    }
}

/// A package tracked by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Colis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poids: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statut: Option<Statut>,
    #[serde(default)]
    pub priorite: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ville_destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<EntityRef<Zone>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub livreur: Option<EntityRef<Livreur>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_expediteur: Option<EntityRef<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destinataire: Option<EntityRef<User>>,
}

impl Colis {
    pub fn is_delivered(&self) -> bool {
        self.statut == Some(Statut::Delivered)
    }
}

/// Body for creating or updating a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ColisRequest {
    pub poids: f64,
    pub ville_destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    pub client_expediteur_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destinataire_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priorite: Option<Priority>,
}
