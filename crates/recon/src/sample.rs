//! Built-in sample feeds: one POS export and two rewards-program exports with
//! the column spellings each vendor uses.

use crate::engine::CandidateText;

pub const SAMPLE_POS: &str = "\
name,service,amount,date,location_id,staff_member
\"Sarah Johnson\",\"Botox Cosmetic\",450.00,\"2024-03-15\",\"LOC001\",\"Dr. Smith\"
\"Michael Chen\",\"Juvederm Ultra\",650.00,\"2024-03-15\",\"LOC001\",\"Dr. Johnson\"
\"Jennifer Smith\",\"Dysport\",380.00,\"2024-03-16\",\"LOC002\",\"Dr. Smith\"
\"Robert Davis\",\"Restylane Lyft\",700.00,\"2024-03-16\",\"LOC001\",\"Dr. Johnson\"
\"Lisa Anderson\",\"Botox Cosmetic\",525.00,\"2024-03-17\",\"LOC001\",\"Dr. Smith\"
\"Amanda Taylor\",\"Juvederm Voluma\",720.00,\"2024-03-18\",\"LOC002\",\"Dr. Johnson\"
";

pub const SAMPLE_ALLE: &str = "\
customer_name,product,points_redeemed,redemption_date,member_id,clinic_code
\"Sarah M Johnson\",\"Botox Cosmetic\",90,\"2024-03-15\",\"ALL001\",\"CLI001\"
\"Michael C Chen\",\"Juvederm Ultra\",130,\"2024-03-15\",\"ALL002\",\"CLI001\"
\"Jenny Smith\",\"Dysport\",76,\"2024-03-16\",\"ALL003\",\"CLI002\"
\"Lisa A Anderson\",\"Botox Cosmetic\",105,\"2024-03-17\",\"ALL004\",\"CLI001\"
\"Amanda M Taylor\",\"Juvederm Voluma\",144,\"2024-03-18\",\"ALL005\",\"CLI002\"
";

pub const SAMPLE_ASPIRE: &str = "\
member_name,treatment,reward_amount,transaction_date,account_id,provider_code
\"Robert J Davis\",\"Restylane Lyft\",140.00,\"2024-03-16\",\"ASP001\",\"PRV001\"
\"David R Williams\",\"Radiesse\",96.00,\"2024-03-19\",\"ASP002\",\"PRV001\"
\"Emma J Thompson\",\"Belotero Balance\",84.00,\"2024-03-20\",\"ASP003\",\"PRV002\"
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFeed {
    Pos,
    Alle,
    Aspire,
}

impl SampleFeed {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pos" => Some(Self::Pos),
            "alle" => Some(Self::Alle),
            "aspire" => Some(Self::Aspire),
            _ => None,
        }
    }

    pub fn csv(self) -> &'static str {
        match self {
            Self::Pos => SAMPLE_POS,
            Self::Alle => SAMPLE_ALLE,
            Self::Aspire => SAMPLE_ASPIRE,
        }
    }
}

/// The two rewards feeds, ready for [`crate::engine::reconcile`].
pub fn sample_candidates() -> [CandidateText<'static>; 2] {
    [
        CandidateText { label: "sample alle", program: "alle", text: SAMPLE_ALLE },
        CandidateText { label: "sample aspire", program: "aspire", text: SAMPLE_ASPIRE },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_table;

    #[test]
    fn samples_parse() {
        assert_eq!(parse_table("pos", SAMPLE_POS).unwrap().rows.len(), 6);
        assert_eq!(parse_table("alle", SAMPLE_ALLE).unwrap().rows.len(), 5);
        assert_eq!(parse_table("aspire", SAMPLE_ASPIRE).unwrap().rows.len(), 3);
    }

    #[test]
    fn feed_names() {
        assert_eq!(SampleFeed::from_name("POS"), Some(SampleFeed::Pos));
        assert_eq!(SampleFeed::from_name("aspire").unwrap().csv(), SAMPLE_ASPIRE);
        assert_eq!(SampleFeed::from_name("brilliant"), None);
    }
}
