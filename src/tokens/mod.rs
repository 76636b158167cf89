//! Token symbols and the day-of-week token table
//!
//! `DAY_TOKENS` is the single mapping from weekday to claimable token. Both the
//! daily-claim handler and the simulation harness read it through
//! [`day_token`], [`day_token_for_index`] or [`token_for_date`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pillars::Pillar;
use crate::types::AvolveError;

/// Named platform currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenSymbol {
    Gen,
    Sap,
    Psp,
    Bsp,
    Sms,
    Scq,
    Spd,
    She,
    Ssa,
    Sgb,
}

/// Claimable token per weekday, 0 = Sunday
pub const DAY_TOKENS: [TokenSymbol; 7] = [
    TokenSymbol::Spd,
    TokenSymbol::She,
    TokenSymbol::Psp,
    TokenSymbol::Ssa,
    TokenSymbol::Bsp,
    TokenSymbol::Sgb,
    TokenSymbol::Sms,
];

impl TokenSymbol {
    pub const ALL: [TokenSymbol; 10] = [
        TokenSymbol::Gen,
        TokenSymbol::Sap,
        TokenSymbol::Psp,
        TokenSymbol::Bsp,
        TokenSymbol::Sms,
        TokenSymbol::Scq,
        TokenSymbol::Spd,
        TokenSymbol::She,
        TokenSymbol::Ssa,
        TokenSymbol::Sgb,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            TokenSymbol::Gen => "GEN",
            TokenSymbol::Sap => "SAP",
            TokenSymbol::Psp => "PSP",
            TokenSymbol::Bsp => "BSP",
            TokenSymbol::Sms => "SMS",
            TokenSymbol::Scq => "SCQ",
            TokenSymbol::Spd => "SPD",
            TokenSymbol::She => "SHE",
            TokenSymbol::Ssa => "SSA",
            TokenSymbol::Sgb => "SGB",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenSymbol::Gen => "Genius",
            TokenSymbol::Sap => "Superachiever Points",
            TokenSymbol::Psp => "Personal Success Puzzle",
            TokenSymbol::Bsp => "Business Success Puzzle",
            TokenSymbol::Sms => "Supermind Superpowers",
            TokenSymbol::Scq => "Superpuzzle Community Quests",
            TokenSymbol::Spd => "Superpuzzle Developments",
            TokenSymbol::She => "Superhuman Enhancements",
            TokenSymbol::Ssa => "Supersociety Advancements",
            TokenSymbol::Sgb => "Supergenius Breakthroughs",
        }
    }

    pub fn pillar(&self) -> Pillar {
        match self {
            TokenSymbol::Gen => Pillar::Supercivilization,
            TokenSymbol::Sap | TokenSymbol::Psp | TokenSymbol::Bsp => Pillar::Superachiever,
            TokenSymbol::Sms => Pillar::Supermind,
            TokenSymbol::Scq | TokenSymbol::Spd => Pillar::Superpuzzle,
            TokenSymbol::She => Pillar::Superhuman,
            TokenSymbol::Ssa => Pillar::Supersociety,
            TokenSymbol::Sgb => Pillar::Supergenius,
        }
    }

    /// Weekday (0 = Sunday) on which this token is claimable, if any
    pub fn claim_day(&self) -> Option<u8> {
        DAY_TOKENS.iter().position(|t| t == self).map(|d| d as u8)
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TokenSymbol {
    type Err = AvolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenSymbol::ALL
            .iter()
            .copied()
            .find(|t| t.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AvolveError::BadRequest(format!("Unknown token: {}", s)))
    }
}

/// Token for a weekday number (0 = Sunday .. 6 = Saturday)
pub fn day_token(day: u8) -> Option<TokenSymbol> {
    DAY_TOKENS.get(day as usize).copied()
}

/// Token earned on simulated day `index`
pub fn day_token_for_index(index: u64) -> TokenSymbol {
    DAY_TOKENS[(index % 7) as usize]
}

/// Token claimable on a calendar date
pub fn token_for_date(date: NaiveDate) -> TokenSymbol {
    DAY_TOKENS[date.weekday().num_days_from_sunday() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_token_total_over_week() {
        for d in 0..7u8 {
            let token = day_token(d).expect("every weekday has a token");
            assert!(TokenSymbol::ALL.contains(&token));
            assert_eq!(day_token(d), Some(token));
        }
        assert_eq!(day_token(7), None);
    }

    #[test]
    fn test_day_tokens_are_distinct() {
        let mut codes: Vec<_> = DAY_TOKENS.iter().map(|t| t.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 7);
    }

    #[test]
    fn test_index_wraps_weekly() {
        assert_eq!(day_token_for_index(0), TokenSymbol::Spd);
        assert_eq!(day_token_for_index(7), TokenSymbol::Spd);
        assert_eq!(day_token_for_index(13), TokenSymbol::Sms);
    }

    #[test]
    fn test_token_for_date_matches_table() {
        // 2024-06-02 was a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        for offset in 0..7 {
            let date = sunday + chrono::Duration::days(offset);
            assert_eq!(token_for_date(date), day_token(offset as u8).unwrap());
        }
    }

    #[test]
    fn test_claim_day() {
        assert_eq!(TokenSymbol::She.claim_day(), Some(1));
        assert_eq!(TokenSymbol::Gen.claim_day(), None);
    }

    #[test]
    fn test_symbol_serde() {
        assert_eq!(serde_json::to_string(&TokenSymbol::Sgb).unwrap(), "\"SGB\"");
        let parsed: TokenSymbol = serde_json::from_str("\"PSP\"").unwrap();
        assert_eq!(parsed, TokenSymbol::Psp);
        assert_eq!("ssa".parse::<TokenSymbol>().unwrap(), TokenSymbol::Ssa);
    }
}
