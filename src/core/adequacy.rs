use crate::domain::model::{
    AdequacyInput, AdequacyOutcome, AdequacyParams, AdequacyResult, ExtractionResult,
};
use crate::utils::error::ComputationError;

/// Catalog item holding the pre-dialysis urea value.
pub const PRE_DIALYSIS_ITEM: &str = "Urea";
/// Catalog item holding the post-dialysis urea value.
pub const POST_DIALYSIS_ITEM: &str = "Urea - Post Dialysis";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// URR and KT/V from pre/post urea and the session parameters.
///
/// ```text
/// R    = post / pre
/// URR  = (1 - R) * 100
/// KT/V = -ln(R - 0.008 * t) + (4 - 3.5 * R) * (UF / W)
/// ```
///
/// Both outputs are rounded to two decimals and fail independently.
pub fn compute_adequacy(input: &AdequacyInput) -> AdequacyResult {
    if input.pre_value == 0.0 {
        return AdequacyResult {
            urr_percent: Err(ComputationError::DivideByZero),
            ktv: Err(ComputationError::DivideByZero),
        };
    }

    let ratio = input.post_value / input.pre_value;
    let urr_percent = Ok(round2((1.0 - ratio) * 100.0));

    AdequacyResult {
        urr_percent,
        ktv: compute_ktv(ratio, input),
    }
}

fn compute_ktv(ratio: f64, input: &AdequacyInput) -> Result<f64, ComputationError> {
    let log_argument = ratio - 0.008 * input.duration_hours;
    if log_argument.is_nan() || log_argument <= 0.0 {
        return Err(ComputationError::LogDomainError);
    }

    if input.post_weight_kg == 0.0 {
        return Err(ComputationError::DivideByZero);
    }

    let ultrafiltration = (4.0 - 3.5 * ratio) * (input.uf_volume_liters / input.post_weight_kg);
    Ok(round2(-log_argument.ln() + ultrafiltration))
}

/// 由萃取結果取得透析前後尿素值；任一缺漏即回傳等待狀態，不呼叫計算
pub fn adequacy_from_results(results: &[ExtractionResult], params: AdequacyParams) -> AdequacyOutcome {
    let value_of = |item: &str| {
        results
            .iter()
            .find(|result| result.item == item && result.is_found())
            .and_then(|result| result.value)
    };

    match (value_of(PRE_DIALYSIS_ITEM), value_of(POST_DIALYSIS_ITEM)) {
        (Some(pre_value), Some(post_value)) => {
            let result = compute_adequacy(&AdequacyInput::new(pre_value, post_value, params));
            if let Err(e) = result.ktv {
                tracing::warn!("⚠️ KT/V could not be calculated: {}", e);
            }
            AdequacyOutcome::Computed(result)
        }
        (pre, post) => {
            let mut missing = Vec::new();
            if pre.is_none() {
                missing.push(PRE_DIALYSIS_ITEM.to_string());
            }
            if post.is_none() {
                missing.push(POST_DIALYSIS_ITEM.to_string());
            }
            AdequacyOutcome::Waiting { missing }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CatalogEntry;

    fn input(pre: f64, post: f64, hours: f64, uf: f64, weight: f64) -> AdequacyInput {
        AdequacyInput {
            pre_value: pre,
            post_value: post,
            duration_hours: hours,
            uf_volume_liters: uf,
            post_weight_kg: weight,
        }
    }

    fn params() -> AdequacyParams {
        AdequacyParams {
            duration_hours: 4.0,
            uf_volume_liters: 1.7,
            post_weight_kg: 53.65,
        }
    }

    #[test]
    fn test_reference_session() {
        let result = compute_adequacy(&input(19.7, 4.0, 4.0, 1.7, 53.65));

        let urr = result.urr_percent.unwrap();
        let ktv = result.ktv.unwrap();
        assert!((urr - 79.7).abs() < 1e-9, "urr = {}", urr);
        assert!((ktv - 1.87).abs() < 1e-9, "ktv = {}", ktv);
    }

    #[test]
    fn test_zero_pre_value_is_divide_by_zero() {
        let result = compute_adequacy(&input(0.0, 4.0, 4.0, 1.7, 53.65));
        assert_eq!(result.urr_percent, Err(ComputationError::DivideByZero));
        assert_eq!(result.ktv, Err(ComputationError::DivideByZero));
    }

    #[test]
    fn test_log_domain_error_keeps_urr() {
        // R = 0.02, 0.008 * 4 = 0.032
        let result = compute_adequacy(&input(100.0, 2.0, 4.0, 1.7, 53.65));
        assert_eq!(result.urr_percent, Ok(98.0));
        assert_eq!(result.ktv, Err(ComputationError::LogDomainError));
        assert_eq!(result.ktv_display(), "Calculation error");
        assert_eq!(result.urr_display(), "98");
    }

    #[test]
    fn test_log_argument_exactly_zero_is_rejected() {
        // R = 0.04, 0.008 * 5 = 0.04
        let result = compute_adequacy(&input(25.0, 1.0, 5.0, 1.0, 60.0));
        assert_eq!(result.ktv, Err(ComputationError::LogDomainError));
    }

    #[test]
    fn test_zero_post_weight_is_divide_by_zero() {
        let result = compute_adequacy(&input(19.7, 4.0, 4.0, 1.7, 0.0));
        assert!(result.urr_percent.is_ok());
        assert_eq!(result.ktv, Err(ComputationError::DivideByZero));
    }

    #[test]
    fn test_deterministic() {
        let session = input(22.4, 7.1, 3.5, 2.2, 71.0);
        assert_eq!(compute_adequacy(&session), compute_adequacy(&session));
    }

    #[test]
    fn test_waiting_when_post_value_missing() {
        let urea = CatalogEntry::new(PRE_DIALYSIS_ITEM, "mmol/L", Some(3.0), Some(9.0));
        let post = CatalogEntry::new(POST_DIALYSIS_ITEM, "mmol/L", Some(3.0), Some(9.0));
        let results = vec![
            ExtractionResult::found(&urea, 19.7),
            ExtractionResult::parse_error(&post),
        ];

        let outcome = adequacy_from_results(&results, params());
        assert_eq!(
            outcome,
            AdequacyOutcome::Waiting {
                missing: vec![POST_DIALYSIS_ITEM.to_string()]
            }
        );
        assert_eq!(outcome.urr_display(), "Waiting for values");
    }

    #[test]
    fn test_flagged_values_are_used_as_plain_numbers() {
        let urea = CatalogEntry::new(PRE_DIALYSIS_ITEM, "mmol/L", Some(3.0), Some(9.0));
        let post = CatalogEntry::new(POST_DIALYSIS_ITEM, "mmol/L", Some(3.0), Some(9.0));
        let results = vec![
            ExtractionResult::found(&urea, 19.7),
            ExtractionResult::found(&post, 4.0),
        ];

        match adequacy_from_results(&results, params()) {
            AdequacyOutcome::Computed(result) => {
                assert_eq!(result.urr_display(), "79.7");
                assert_eq!(result.ktv_display(), "1.87");
            }
            other => panic!("expected computed outcome, got {:?}", other),
        }
    }
}
