// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race, driver and prediction models as served by the backend.

use serde::{Deserialize, Serialize};

/// A race session that can be predicted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub race_id: u64,
    pub race_name: String,
    /// Session type (Race, Sprint, ...)
    pub race_type: String,
    /// Race date (ISO 8601)
    pub race_date: String,
}

/// A driver entered in a specific race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub driver_id: u64,
    pub race_id: u64,
    pub driver_number: u32,
    pub driver_name: String,
    pub team: String,
}

/// A user's top-three prediction for one race.
///
/// Unique per `(user_email, race_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guess_id: Option<u64>,
    pub race_id: u64,
    #[serde(default)]
    pub position_1_driver_id: Option<u64>,
    #[serde(default)]
    pub position_2_driver_id: Option<u64>,
    #[serde(default)]
    pub position_3_driver_id: Option<u64>,
    pub user_email: String,
}

impl Guess {
    /// Position ids in finishing order (index 0 = 1st place).
    pub fn positions(&self) -> [Option<u64>; 3] {
        [
            self.position_1_driver_id,
            self.position_2_driver_id,
            self.position_3_driver_id,
        ]
    }
}

/// One row of a live standings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverPosition {
    pub position: u32,
    pub driver_number: u32,
    pub driver_name: String,
}

/// Standings for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standings {
    pub session_key: u64,
    pub standings: Vec<DriverPosition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_wire_format() {
        let guess: Guess = serde_json::from_str(
            r#"{"race_id":9,"position_1_driver_id":44,"position_2_driver_id":1,
                "position_3_driver_id":null,"user_email":"ada@example.com"}"#,
        )
        .unwrap();

        assert_eq!(guess.guess_id, None);
        assert_eq!(guess.positions(), [Some(44), Some(1), None]);

        let json = serde_json::to_value(&guess).unwrap();
        assert!(json.get("guess_id").is_none());
        assert_eq!(json["position_3_driver_id"], serde_json::Value::Null);
    }
}
