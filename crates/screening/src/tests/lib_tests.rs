use super::*;

fn inputs(
    family_history: FamilyHistory,
    genetic_score: u8,
    apoe: ApoeStatus,
    variant_9p21: Variant9p21,
) -> RiskInputs {
    RiskInputs {
        family_history,
        genetic_score,
        apoe,
        variant_9p21,
    }
}

#[test]
fn scores_stay_within_bounds_for_every_ordinal_combination() {
    for family in FamilyHistory::ALL {
        for apoe in ApoeStatus::ALL {
            for variant in Variant9p21::ALL {
                for genetic in [0u8, 1, 50, 99, 100] {
                    let assessment = calculate_risk(&inputs(family, genetic, apoe, variant));
                    assert!(
                        (0.0..=100.0).contains(&assessment.score()),
                        "score {} out of bounds",
                        assessment.score()
                    );
                    assert_eq!(assessment.tier(), tier_for_score(assessment.score()));
                }
            }
        }
    }
}

#[test]
fn worked_example_lands_in_moderate() {
    let assessment = calculate_risk(&inputs(
        FamilyHistory::OneParent,
        40,
        ApoeStatus::OneE4Allele,
        Variant9p21::Present,
    ));
    assert_eq!(assessment.score(), 52.5);
    assert_eq!(assessment.tier(), RiskTier::Moderate);
}

#[test]
fn maximal_inputs_clamp_to_one_hundred() {
    let assessment = calculate_risk(&inputs(
        FamilyHistory::BothParents,
        100,
        ApoeStatus::TwoE4Alleles,
        Variant9p21::Present,
    ));
    assert_eq!(assessment.score(), 100.0);
    assert_eq!(assessment.tier(), RiskTier::High);
    assert_eq!(assessment.meter_fraction(), 1.0);
}

#[test]
fn tier_boundaries_are_half_open_below_and_closed_into_high() {
    assert_eq!(tier_for_score(0.0), RiskTier::Low);
    assert_eq!(tier_for_score(29.9), RiskTier::Low);
    assert_eq!(tier_for_score(30.0), RiskTier::Moderate);
    assert_eq!(tier_for_score(59.9), RiskTier::Moderate);
    assert_eq!(tier_for_score(60.0), RiskTier::High);
    assert_eq!(tier_for_score(100.0), RiskTier::High);
}

#[test]
fn empty_genetic_score_counts_as_zero() {
    assert_eq!(parse_genetic_score(""), Ok(0));
    assert_eq!(parse_genetic_score("   "), Ok(0));

    let assessment = calculate_risk(&inputs(
        FamilyHistory::OneParent,
        parse_genetic_score("").expect("empty field"),
        ApoeStatus::OneE4Allele,
        Variant9p21::Present,
    ));
    assert_eq!(assessment.score(), 32.5);
}

#[test]
fn out_of_range_genetic_score_is_rejected() {
    assert_eq!(
        parse_genetic_score("150"),
        Err(ScreeningError::GeneticScoreOutOfRange(150))
    );
    assert_eq!(
        parse_genetic_score("-3"),
        Err(ScreeningError::GeneticScoreOutOfRange(-3))
    );
    assert_eq!(parse_genetic_score("101"), Err(ScreeningError::GeneticScoreOutOfRange(101)));
}

#[test]
fn non_numeric_genetic_score_is_rejected() {
    assert_eq!(
        parse_genetic_score("abc"),
        Err(ScreeningError::GeneticScoreNotANumber)
    );
    assert_eq!(
        parse_genetic_score("12.5"),
        Err(ScreeningError::GeneticScoreNotANumber)
    );
}

#[test]
fn advisory_field_check_tracks_the_parser() {
    assert!(genetic_score_field_is_valid(""));
    assert!(genetic_score_field_is_valid("0"));
    assert!(genetic_score_field_is_valid("100"));
    assert!(!genetic_score_field_is_valid("101"));
    assert!(!genetic_score_field_is_valid("7.5"));
    assert!(!genetic_score_field_is_valid("high"));
}

#[test]
fn parsed_bounds_round_trip_through_the_formula() {
    let low = calculate_risk(&inputs(
        FamilyHistory::None,
        parse_genetic_score("0").expect("zero"),
        ApoeStatus::NonCarrier,
        Variant9p21::Absent,
    ));
    assert_eq!(low.score(), 0.0);
    assert_eq!(low.tier(), RiskTier::Low);

    let ceiling = calculate_risk(&inputs(
        FamilyHistory::None,
        parse_genetic_score("100").expect("max"),
        ApoeStatus::NonCarrier,
        Variant9p21::Absent,
    ));
    assert_eq!(ceiling.score(), 50.0);
    assert_eq!(ceiling.tier(), RiskTier::Moderate);
}
