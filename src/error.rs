use std::collections::HashSet;

use thiserror::Error;

use crate::models::RaceCard;

/// Errors at the crate's input edges (strategy names, race files)
///
/// The probability and allocation core itself never fails; degenerate
/// fields resolve to empty results instead.
#[derive(Debug, Error)]
pub enum KeibaError {
    #[error("Unknown allocation strategy: {0} (expected kelly or covering)")]
    UnknownStrategy(String),

    #[error("Invalid race file: {0}")]
    InvalidRace(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Budget must be a positive amount of currency
pub fn validate_budget(budget: i64) -> Result<(), KeibaError> {
    if budget <= 0 {
        return Err(KeibaError::Validation(format!(
            "Budget must be positive, got {}",
            budget
        )));
    }
    Ok(())
}

/// Betting unit must be a positive amount of currency
pub fn validate_unit(unit: i64) -> Result<(), KeibaError> {
    if unit <= 0 {
        return Err(KeibaError::Validation(format!(
            "Betting unit must be positive, got {}",
            unit
        )));
    }
    Ok(())
}

pub fn validate_alpha(alpha: f64) -> Result<(), KeibaError> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(KeibaError::Validation(format!(
            "Alpha must be between 0 and 1, got {}",
            alpha
        )));
    }
    Ok(())
}

/// Horse numbers identify stakes at settlement, so they must be unique
pub fn validate_race_card(card: &RaceCard) -> Result<(), KeibaError> {
    let mut seen = HashSet::new();
    for entrant in &card.entrants {
        if !seen.insert(entrant.horse_number) {
            return Err(KeibaError::Validation(format!(
                "Race {}: duplicate horse number {}",
                card.race_id, entrant.horse_number
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entrant;

    #[test]
    fn test_validate_budget() {
        assert!(validate_budget(1).is_ok());
        assert!(validate_budget(0).is_err());
        assert!(validate_budget(-100).is_err());
    }

    #[test]
    fn test_validate_unit() {
        assert!(validate_unit(100).is_ok());
        assert!(validate_unit(0).is_err());
    }

    #[test]
    fn test_validate_alpha() {
        assert!(validate_alpha(0.0).is_ok());
        assert!(validate_alpha(0.4).is_ok());
        assert!(validate_alpha(1.0).is_ok());
        assert!(validate_alpha(1.1).is_err());
        assert!(validate_alpha(-0.1).is_err());
    }

    #[test]
    fn test_validate_race_card_duplicates() {
        let mut card = RaceCard {
            race_id: "r1".to_string(),
            race_name: None,
            entrants: vec![Entrant::with_odds(1, 2.0), Entrant::with_odds(2, 3.0)],
        };
        assert!(validate_race_card(&card).is_ok());

        card.entrants.push(Entrant::with_odds(2, 4.0));
        let err = validate_race_card(&card).unwrap_err();
        assert!(err.to_string().contains("duplicate horse number 2"));
    }

    #[test]
    fn test_validate_race_card_missing_numbers() {
        // Numbers default to 0 when absent from the file
        let card = RaceCard {
            race_id: "r1".to_string(),
            race_name: None,
            entrants: vec![Entrant::default(), Entrant::default()],
        };
        assert!(validate_race_card(&card).is_err());

        let single = RaceCard {
            entrants: vec![Entrant::default()],
            ..card
        };
        assert!(validate_race_card(&single).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = KeibaError::UnknownStrategy("martingale".to_string());
        assert!(err.to_string().contains("martingale"));

        let err = KeibaError::Validation("test error".to_string());
        assert!(err.to_string().contains("Validation error"));
    }

    #[test]
    fn test_invalid_race_from_json() {
        let err: KeibaError = serde_json::from_str::<crate::models::RaceCard>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, KeibaError::InvalidRace(_)));
    }
}
