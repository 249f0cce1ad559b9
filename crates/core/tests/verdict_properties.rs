//! Property tests for verdict precedence and frame aggregation

use fonttik_common::{ColorblindResult, ColorblindType, FrameResults, Rect, ResultBox, ResultType};
use proptest::prelude::*;

fn result_type() -> impl Strategy<Value = ResultType> {
    prop_oneof![
        Just(ResultType::Pass),
        Just(ResultType::Unrecognized),
        Just(ResultType::Warning),
        Just(ResultType::Fail),
    ]
}

fn severity(result_type: ResultType) -> u8 {
    match result_type {
        ResultType::Pass => 0,
        ResultType::Unrecognized => 1,
        ResultType::Warning => 2,
        ResultType::Fail => 3,
    }
}

#[test]
fn proptest_worst_follows_severity() {
    proptest!(|(a in result_type(), b in result_type(), c in result_type())| {
        prop_assert_eq!(a.worst(b), b.worst(a));
        prop_assert_eq!(a.worst(b).worst(c), a.worst(b.worst(c)));
        prop_assert_eq!(severity(a.worst(b)), severity(a).max(severity(b)));
        prop_assert_eq!(a.worst(ResultType::Fail), ResultType::Fail);
        prop_assert_eq!(a.worst(ResultType::Pass), a);
    });
}

#[test]
fn proptest_frame_verdict_is_worst_box() {
    proptest!(|(types in prop::collection::vec((result_type(), result_type()), 1..12))| {
        let boxes: Vec<ResultBox> = types
            .iter()
            .map(|&(main, protan)| {
                let mut result = ResultBox::new(main, Rect::new(0, 0, 10, 10), 3.0);
                result.colorblind.insert(
                    ColorblindType::Protanopia,
                    ColorblindResult { value: 3.0, result_type: protan },
                );
                result
            })
            .collect();
        let frame = FrameResults::from_boxes(4, Some(0.2), boxes);

        let expected_pass = types.iter().all(|(main, _)| *main != ResultType::Fail);
        prop_assert_eq!(frame.overall_pass, expected_pass);

        let worst_protan = types
            .iter()
            .map(|(_, protan)| *protan)
            .fold(ResultType::Pass, ResultType::worst);
        let verdict = frame.colorblind[&ColorblindType::Protanopia];
        prop_assert_eq!(verdict.result_type, worst_protan);
        prop_assert_eq!(verdict.pass, worst_protan != ResultType::Fail);
    });
}
