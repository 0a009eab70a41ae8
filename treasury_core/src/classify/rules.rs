use crate::transfers::dto::{FeeCategory, TransferRecord};

pub const MARKETPLACE_FEE_COLLECTOR: &str = "0xfff9ce5f71ca6178d3beecedb61e7eff1602950e";
pub const BREEDING_FEE_CONTRACT: &str = "0xa8754b9fa15fc18bb59458815510e40a12cd2014";
pub const BURN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
pub const ASCENSION_CONTRACT: &str = "0x97a9107c1793bc407d6f527b77e7fff4d812bece";
pub const PARTS_EVOLUTION_CONTRACT: &str = "0x12b707c3d2786570cfdc3a998a085b62acdba4b3";
pub const RUNES_CHARMS_MINTER: &str = "0x36b628e771b0ca12a135e0a7b8e0394f99dce95b";

/// Constraints on a single leg. Unset fields match anything; addresses compare
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegPattern {
    pub from: Option<String>,
    pub to: Option<String>,
    pub contract: Option<String>,
}

impl LegPattern {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn from(mut self, address: &str) -> Self {
        self.from = Some(address.to_lowercase());
        self
    }

    pub fn to(mut self, address: &str) -> Self {
        self.to = Some(address.to_lowercase());
        self
    }

    pub fn contract(mut self, address: &str) -> Self {
        self.contract = Some(address.to_lowercase());
        self
    }

    pub fn matches(&self, leg: &TransferRecord) -> bool {
        field_matches(&self.from, &leg.from)
            && field_matches(&self.to, &leg.to)
            && field_matches(&self.contract, &leg.contract_address)
    }
}

fn field_matches(expected: &Option<String>, actual: &str) -> bool {
    expected
        .as_deref()
        .map_or(true, |expected| expected.eq_ignore_ascii_case(actual))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegMatcher {
    /// At least one leg matches.
    AnyLeg(LegPattern),
    /// The transaction has exactly one leg and it matches.
    SoleLeg(LegPattern),
}

impl LegMatcher {
    pub fn matches(&self, legs: &[TransferRecord]) -> bool {
        match self {
            LegMatcher::AnyLeg(pattern) => legs.iter().any(|leg| pattern.matches(leg)),
            LegMatcher::SoleLeg(pattern) => legs.len() == 1 && pattern.matches(&legs[0]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRule {
    pub category: FeeCategory,
    pub matcher: LegMatcher,
}

/// Ordered fee rules. The first rule whose matcher accepts the leg set decides the
/// category, whatever order the legs came in. Rules can only be appended so that
/// adding a category never relabels transactions an earlier rule already claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<FeeRule>,
}

impl RuleTable {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn treasury_defaults(treasury: &str) -> Self {
        let mut table = Self::empty();
        table
            .append(
                FeeCategory::Marketplace,
                LegMatcher::AnyLeg(LegPattern::any().from(MARKETPLACE_FEE_COLLECTOR).to(treasury)),
            )
            .append(
                FeeCategory::Breeding,
                LegMatcher::AnyLeg(LegPattern::any().contract(BREEDING_FEE_CONTRACT).to(BURN_ADDRESS)),
            )
            .append(
                FeeCategory::Ascending,
                LegMatcher::SoleLeg(LegPattern::any().contract(ASCENSION_CONTRACT).to(treasury)),
            )
            .append(
                FeeCategory::PartsEvol,
                LegMatcher::AnyLeg(LegPattern::any().contract(PARTS_EVOLUTION_CONTRACT)),
            )
            .append(
                FeeCategory::RunesCharmsMint,
                LegMatcher::AnyLeg(LegPattern::any().from(RUNES_CHARMS_MINTER)),
            );
        table
    }

    pub fn append(&mut self, category: FeeCategory, matcher: LegMatcher) -> &mut Self {
        self.rules.push(FeeRule { category, matcher });
        self
    }

    pub fn rules(&self) -> &[FeeRule] {
        &self.rules
    }

    /// `None` when there are no legs to judge; `Unknown` when no rule matches.
    pub fn classify(&self, legs: &[TransferRecord]) -> Option<FeeCategory> {
        if legs.is_empty() {
            return None;
        }

        Some(
            self.rules
                .iter()
                .find(|rule| rule.matcher.matches(legs))
                .map(|rule| rule.category)
                .unwrap_or(FeeCategory::Unknown),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TREASURY_WALLET as TREASURY;
    use crate::transfers::storage::tests::leg;

    fn with_contract(mut record: TransferRecord, contract: &str) -> TransferRecord {
        record.contract_address = contract.to_string();
        record
    }

    fn table() -> RuleTable {
        RuleTable::treasury_defaults(TREASURY)
    }

    #[test]
    fn test_each_default_rule() {
        let marketplace = leg("0x1", "WETH", MARKETPLACE_FEE_COLLECTOR, TREASURY, "1");
        assert_eq!(table().classify(&[marketplace]), Some(FeeCategory::Marketplace));

        let breeding = with_contract(leg("0x2", "AXS", "0x9", BURN_ADDRESS, "1"), BREEDING_FEE_CONTRACT);
        assert_eq!(table().classify(&[breeding]), Some(FeeCategory::Breeding));

        let ascension = with_contract(leg("0x3", "AXS", "0x9", TREASURY, "1"), ASCENSION_CONTRACT);
        assert_eq!(table().classify(&[ascension]), Some(FeeCategory::Ascending));

        let parts = with_contract(leg("0x4", "AXS", "0x9", "0x8", "1"), PARTS_EVOLUTION_CONTRACT);
        assert_eq!(table().classify(&[parts]), Some(FeeCategory::PartsEvol));

        let mint = leg("0x5", "AXS", RUNES_CHARMS_MINTER, "0x8", "1");
        assert_eq!(table().classify(&[mint]), Some(FeeCategory::RunesCharmsMint));

        let other = leg("0x6", "AXS", "0x7", TREASURY, "1");
        assert_eq!(table().classify(&[other]), Some(FeeCategory::Unknown));
    }

    #[test]
    fn test_rule_order_beats_leg_order() {
        let parts = with_contract(leg("0x1", "AXS", "0x9", "0x8", "1"), PARTS_EVOLUTION_CONTRACT);
        let marketplace = leg("0x1", "WETH", MARKETPLACE_FEE_COLLECTOR, TREASURY, "1");

        assert_eq!(
            table().classify(&[parts.clone(), marketplace.clone()]),
            Some(FeeCategory::Marketplace)
        );
        assert_eq!(
            table().classify(&[marketplace, parts]),
            Some(FeeCategory::Marketplace)
        );
    }

    #[test]
    fn test_ascension_needs_a_single_leg() {
        let ascension = with_contract(leg("0x1", "AXS", "0x9", TREASURY, "1"), ASCENSION_CONTRACT);
        let extra = leg("0x1", "SLP", "0x9", "0x8", "1");

        assert_eq!(
            table().classify(&[ascension, extra]),
            Some(FeeCategory::Unknown)
        );
    }

    #[test]
    fn test_addresses_compare_case_insensitively() {
        let marketplace = leg(
            "0x1",
            "WETH",
            &MARKETPLACE_FEE_COLLECTOR.to_uppercase(),
            &TREASURY.to_uppercase(),
            "1",
        );
        assert_eq!(table().classify(&[marketplace]), Some(FeeCategory::Marketplace));
    }

    #[test]
    fn test_no_legs_is_no_decision() {
        assert_eq!(table().classify(&[]), None);
    }

    #[test]
    fn test_appended_rule_only_claims_leftovers() {
        let mut table = table();
        table.append(
            FeeCategory::Breeding,
            LegMatcher::AnyLeg(LegPattern::any().from("0x7")),
        );

        let leftover = leg("0x1", "AXS", "0x7", TREASURY, "1");
        let marketplace = leg("0x2", "WETH", MARKETPLACE_FEE_COLLECTOR, TREASURY, "1");

        assert_eq!(table.classify(&[leftover]), Some(FeeCategory::Breeding));
        assert_eq!(table.classify(&[marketplace]), Some(FeeCategory::Marketplace));
        assert_eq!(table.rules().len(), 6);
    }
}
