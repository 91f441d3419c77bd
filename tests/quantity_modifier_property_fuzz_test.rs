use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseError, TestCaseResult};
use quantity_modifier::{
    CHANGE_EVENT, Document, QuantityChange, QuantityModifier, clamp_upper_first,
    parse_leading_int,
};

const WIDGET_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/quantity_modifier_property_fuzz_test.txt";
const DEFAULT_WIDGET_PROPTEST_CASES: u32 = 128;

const FIELD: &str = "[data-quantity-modifier-field]";

#[derive(Clone, Debug)]
enum WidgetAction {
    Increment,
    Decrement,
    Type(String),
    SetValue(i64),
    Reattach,
}

#[derive(Clone, Copy, Debug)]
struct Range {
    min: i64,
    max: i64,
    value: i64,
}

fn widget_proptest_cases() -> u32 {
    std::env::var("QUANTITY_MODIFIER_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_WIDGET_PROPTEST_CASES)
}

fn range_strategy() -> BoxedStrategy<Range> {
    (-20i64..=20, 0i64..=15)
        .prop_flat_map(|(min, span)| {
            let max = min + span;
            (Just(min), Just(max), min..=max)
        })
        .prop_map(|(min, max, value)| Range { min, max, value })
        .boxed()
}

fn typed_text_strategy() -> BoxedStrategy<String> {
    vec(
        prop_oneof![
            Just('0'),
            Just('1'),
            Just('2'),
            Just('5'),
            Just('9'),
            Just('-'),
            Just('+'),
            Just(' '),
            Just('a'),
            Just('x'),
        ],
        0..=5,
    )
    .prop_map(|chars| chars.into_iter().collect())
    .boxed()
}

fn action_strategy(range: Range) -> BoxedStrategy<WidgetAction> {
    prop_oneof![
        4 => Just(WidgetAction::Increment),
        4 => Just(WidgetAction::Decrement),
        4 => typed_text_strategy().prop_map(WidgetAction::Type),
        1 => (range.min..=range.max).prop_map(WidgetAction::SetValue),
        1 => Just(WidgetAction::Reattach),
    ]
    .boxed()
}

fn scenario_strategy() -> BoxedStrategy<(Range, Vec<WidgetAction>)> {
    range_strategy()
        .prop_flat_map(|range| (Just(range), vec(action_strategy(range), 1..=24)))
        .boxed()
}

fn fail(err: quantity_modifier::Error) -> TestCaseError {
    TestCaseError::fail(format!("{err:?}"))
}

fn expected_after(action: &WidgetAction, range: Range, current: i64) -> i64 {
    match action {
        WidgetAction::Increment => (current + 1).min(range.max),
        WidgetAction::Decrement => (current - 1).max(range.min),
        WidgetAction::Type(text) => parse_leading_int(text)
            .map(|typed| clamp_upper_first(typed, range.min, range.max))
            .unwrap_or(current),
        WidgetAction::SetValue(value) => *value,
        WidgetAction::Reattach => current,
    }
}

fn run_action(doc: &mut Document, action: &WidgetAction) -> quantity_modifier::Result<()> {
    match action {
        WidgetAction::Increment => doc.click("[data-action-increment]"),
        WidgetAction::Decrement => doc.click("[data-action-decrement]"),
        WidgetAction::Type(text) => doc.type_text(FIELD, text),
        WidgetAction::SetValue(value) => doc.set_quantity_value("quantity-modifier", *value),
        WidgetAction::Reattach => {
            let node = doc.detach("quantity-modifier")?;
            doc.append("#mount", node)
        }
    }
}

fn assert_widget_follows_model(range: Range, actions: &[WidgetAction]) -> TestCaseResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let html = format!(
        r#"<div id="mount"><quantity-modifier min="{}" max="{}" value="{}"></quantity-modifier></div>"#,
        range.min, range.max, range.value
    );
    let mut doc = Document::from_html(&html).map_err(fail)?;
    QuantityModifier::define(&mut doc).map_err(fail)?;
    doc.listen("#mount", CHANGE_EVENT).map_err(fail)?;

    let mut current = range.value;
    for (step, action) in actions.iter().enumerate() {
        let expected = expected_after(action, range, current);
        run_action(&mut doc, action).map_err(fail)?;

        let view = doc.quantity_modifier("quantity-modifier").map_err(fail)?;
        prop_assert_eq!(
            view.value(),
            expected,
            "value mismatch at step {}: {:?}, actions={:?}",
            step,
            action,
            actions
        );
        prop_assert!(range.min <= view.value() && view.value() <= range.max);

        let notified = doc
            .take_observed_events()
            .iter()
            .map(|event| event.detail_as::<QuantityChange>())
            .collect::<quantity_modifier::Result<Vec<_>>>()
            .map_err(fail)?;
        let user_driven = !matches!(action, WidgetAction::SetValue(_) | WidgetAction::Reattach);
        if user_driven && expected != current {
            prop_assert_eq!(notified, vec![Some(QuantityChange { value: expected })]);
            prop_assert_eq!(doc.value(FIELD).map_err(fail)?, expected.to_string());
        } else {
            prop_assert!(
                notified.is_empty(),
                "unexpected notification at step {}: {:?}",
                step,
                action
            );
        }

        let increment = doc.select("[data-action-increment]").map_err(fail)?;
        prop_assert_eq!(doc.listener_count(increment, "click"), 1);
        prop_assert_eq!(doc.count("style").map_err(fail)?, 1);

        current = expected;
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: widget_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(WIDGET_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn widget_actions_keep_value_in_range_and_notify_once_per_change(
        (range, actions) in scenario_strategy()
    ) {
        assert_widget_follows_model(range, &actions)?;
    }
}
