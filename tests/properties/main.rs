//! Property tests for the pure pipeline stages.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value;

use promptex::pipeline::render::render_one;
use promptex::pipeline::{
    Components, ExportOptions, Metadata, NoopEnhancer, MemorySink, Pipeline, PipelineConfig,
    PromptTransformer, PromptValidator, RawInput, ShapedPrompt, StructuredPrompt,
    ValidationStatus,
};
use promptex::rules::{ExportFormat, Platform};
use promptex::test_utils::fixtures::fixed_timestamp;

fn arb_platform() -> impl Strategy<Value = Platform> {
    prop::sample::select(Platform::ALL.to_vec())
}

fn arb_tags() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z]{3,12}", 0..4)
}

fn arb_prompt() -> impl Strategy<Value = StructuredPrompt> {
    (".{0,600}", arb_tags(), arb_tags()).prop_map(|(content, styles, qualities)| {
        let components = Components {
            styles,
            qualities,
            ..Components::default()
        };
        let mut metadata = Metadata::new();
        components.write_into(&mut metadata);
        StructuredPrompt {
            content,
            components,
            metadata,
        }
    })
}

fn arb_metadata() -> impl Strategy<Value = Metadata> {
    let value = prop_oneof![
        ".{0,40}".prop_map(Value::String),
        prop::collection::vec("[a-z ]{0,12}", 0..4)
            .prop_map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
    ];
    prop::collection::btree_map("[a-z_]{1,12}", value, 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn shaped_content_never_exceeds_platform_limit(
        mut prompt in arb_prompt(),
        padding in 0usize..12_000,
        platform in arb_platform(),
    ) {
        prompt.content.push_str(&"x".repeat(padding));
        let shaped = PromptTransformer.shape(&prompt, platform);
        prop_assert!(shaped.content.chars().count() <= platform.profile().max_content_length);
    }

    #[test]
    fn verdict_status_matches_messages(prompt in arb_prompt(), platform in arb_platform()) {
        let verdict = PromptValidator.validate(&prompt, platform);
        prop_assert_eq!(verdict.status == ValidationStatus::Error, !verdict.errors.is_empty());
        if !verdict.warnings.is_empty() {
            prop_assert!(verdict.status >= ValidationStatus::Warning);
        }
        if verdict.errors.is_empty() && verdict.warnings.is_empty() {
            prop_assert_eq!(verdict.status, ValidationStatus::Valid);
        }
    }

    #[test]
    fn forbidden_phrases_match_any_case(
        prefix in "[a-z ]{0,20}",
        upper in prop::collection::vec(any::<bool>(), 4),
    ) {
        let phrase: String = "nsfw"
            .chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect();
        let prompt = StructuredPrompt {
            content: format!("{prefix} {phrase} scene"),
            components: Components::default(),
            metadata: Metadata::new(),
        };
        let verdict = PromptValidator.validate(&prompt, Platform::Midjourney);
        prop_assert_eq!(verdict.status, ValidationStatus::Error);
    }

    #[test]
    fn json_render_recovers_content_and_metadata(content in ".{0,200}", metadata in arb_metadata()) {
        let shaped = ShapedPrompt {
            content,
            metadata,
            platform: Platform::Custom,
        };
        let rendered = render_one(&shaped, ExportFormat::Json, fixed_timestamp()).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();

        prop_assert_eq!(parsed["prompt"].as_str(), Some(shaped.content.as_str()));
        prop_assert_eq!(parsed["metadata"].as_object(), Some(&shaped.metadata));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn batch_summary_accounts_for_every_item(
        texts in prop::collection::vec("[a-z]{1,10}( [a-z]{1,10}){0,5}", 1..8),
        platform in arb_platform(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let sink = Arc::new(MemorySink::new());
        let pipeline = Pipeline::new(PipelineConfig::default(), Arc::new(NoopEnhancer), sink.clone());
        let options = ExportOptions {
            platform,
            format: ExportFormat::Csv,
            enhancement: Default::default(),
        };
        let items: Vec<RawInput> = texts.iter().map(RawInput::text).collect();

        let outcome = runtime.block_on(pipeline.export_items(items, &options)).unwrap();
        let summary = outcome.summary;

        prop_assert_eq!(summary.total_prompts, texts.len());
        prop_assert_eq!(
            summary.valid_prompts + summary.warning_prompts + summary.error_prompts,
            texts.len()
        );
        prop_assert_eq!(outcome.exported_prompts.len(), texts.len());
        prop_assert_eq!(sink.len(), 1);
    }
}
