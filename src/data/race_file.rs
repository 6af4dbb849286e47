//! Race card JSON loading
//!
//! A race file holds one `RaceCard`; a backtest file holds a list of
//! `HistoricalRace` records (race card plus winning horse number).

use std::fs;
use std::path::Path;

use crate::backtesting::HistoricalRace;
use crate::error::{validate_race_card, KeibaError};
use crate::models::RaceCard;

/// Load a race card from a JSON file, rejecting duplicate horse numbers
pub fn load_race_card<P: AsRef<Path>>(path: P) -> Result<RaceCard, KeibaError> {
    let content = fs::read_to_string(path.as_ref())?;
    let card: RaceCard = serde_json::from_str(&content)?;
    validate_race_card(&card)?;
    Ok(card)
}

/// Load settled races for backtesting from a JSON array
pub fn load_historical_races<P: AsRef<Path>>(path: P) -> Result<Vec<HistoricalRace>, KeibaError> {
    let content = fs::read_to_string(path.as_ref())?;
    let races: Vec<HistoricalRace> = serde_json::from_str(&content)?;
    for race in &races {
        validate_race_card(&race.card)?;
    }
    Ok(races)
}

/// Write a race card as pretty-printed JSON
pub fn save_race_card<P: AsRef<Path>>(path: P, card: &RaceCard) -> Result<(), KeibaError> {
    let json = serde_json::to_string_pretty(card)?;
    fs::write(path.as_ref(), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entrant, PastResult};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("keiba_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_race_card_roundtrip_file() {
        let mut entrant = Entrant::with_odds(3, 7.5);
        entrant.horse_id = "2019104308".to_string();
        entrant.race_history = vec![PastResult::new(Some(2), 16, 34.6)];
        let card = RaceCard {
            race_id: "202505021211".to_string(),
            race_name: Some("日本ダービー".to_string()),
            entrants: vec![entrant],
        };

        let path = temp_path("card");
        save_race_card(&path, &card).unwrap();
        let loaded = load_race_card(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.race_id, card.race_id);
        assert_eq!(loaded.entrants, card.entrants);
    }

    #[test]
    fn test_load_historical_races() {
        let path = temp_path("history");
        fs::write(
            &path,
            r#"[{"card": {"race_id": "r1", "entrants": [{"horse_number": 1, "odds_win": 2.0}]}, "winner": 1},
                {"card": {"race_id": "r2", "entrants": []}}]"#,
        )
        .unwrap();
        let races = load_historical_races(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(races.len(), 2);
        assert_eq!(races[0].winner, Some(1));
        assert_eq!(races[1].winner, None);
    }

    #[test]
    fn test_unnumbered_entrants_rejected() {
        let path = temp_path("unnumbered");
        fs::write(
            &path,
            r#"{"race_id": "r1", "entrants": [{"odds_win": 2.0}, {"odds_win": 3.0}]}"#,
        )
        .unwrap();
        let err = load_race_card(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(matches!(err, KeibaError::Validation(_)));
    }

    #[test]
    fn test_historical_race_duplicate_numbers_rejected() {
        let path = temp_path("history_dup");
        fs::write(
            &path,
            r#"[{"card": {"race_id": "r1", "entrants": [
                {"horse_number": 3, "odds_win": 2.0},
                {"horse_number": 3, "odds_win": 5.0}]}, "winner": 3}]"#,
        )
        .unwrap();
        let err = load_historical_races(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(matches!(err, KeibaError::Validation(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_race_card("/nonexistent/keiba/race.json").unwrap_err();
        assert!(matches!(err, KeibaError::Io(_)));
    }

    #[test]
    fn test_malformed_file() {
        let path = temp_path("malformed");
        fs::write(&path, "{\"race_id\": 1}").unwrap();
        let err = load_race_card(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(matches!(err, KeibaError::InvalidRace(_)));
    }
}
