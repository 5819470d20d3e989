// ==========================================
// CSV Import+ - ImportApi 集成测试
// ==========================================
// 覆盖: 快速导入优先级 / 内容分析与状态栏 / 子牌组 / 配置覆写
// 宿主: 临时 SQLite 集合库；失败注入用 MockHost
// ==========================================

mod test_helpers;

use csv_import_plus::api::{
    render_outcome, render_status, render_subdeck_created, ApiError, ImportApi,
};
use csv_import_plus::domain::{
    AnalysisOptions, ContainerSelection, ContentAnalysis, Delimiter, DelimiterMode, Directives,
    FormatStatus, ImportRequest, SchemaSource,
};
use csv_import_plus::repository::ContainerRepository;
use test_helpers::{create_test_state, MockHost};

fn request_with_override(name: &str, header_present: bool) -> ImportRequest {
    ImportRequest {
        schema_override: Some(name.to_string()),
        header_present,
        ..Default::default()
    }
}

// ==========================================
// 快速导入
// ==========================================

#[test]
fn test_quick_import_with_override_header_blank_rows_and_tags() {
    let (_db, state) = create_test_state().unwrap();
    let raw = "Front,Back\nQ1,A1\n,\nQ2,A2,tag1 tag2\n";

    let response = state
        .import_api
        .quick_import(raw, &request_with_override(" basic ", true))
        .unwrap();
    assert_eq!(response.outcome.added, 2);
    assert_eq!(response.outcome.skipped_empty, 1);
    assert_eq!(response.outcome.delimiter, Delimiter::Comma);
    assert_eq!(response.deck.name, "Default");
    assert_eq!(response.schema.schema.name, "Basic");
    assert_eq!(response.schema.source, SchemaSource::Override);
    assert!(response.delimiter_auto_detected);

    let notes = state.collection.notes_in_container(response.deck.id).unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].fields, vec!["Q1", "A1"]);
    assert_eq!(notes[1].fields, vec!["Q2", "A2"]);
    assert_eq!(notes[1].tags, vec!["tag1", "tag2"]);

    assert_eq!(
        render_outcome(&response),
        "Import complete!\n\nAdded: 2 note(s) to deck 'Default'\nSkipped empty rows: 1\n\nUsed delimiter: Comma (,)"
    );

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["outcome"]["added"], 2);
    assert_eq!(json["schema"]["source"], "override");
}

#[test]
fn test_auto_pick_follows_widest_sampled_row() {
    let (_db, state) = create_test_state().unwrap();
    let raw = "Front,Back\nQ1,A1\nQ2,A2,extra";

    let request = ImportRequest {
        header_present: true,
        ..Default::default()
    };
    let response = state.import_api.quick_import(raw, &request).unwrap();
    assert_eq!(response.schema.schema.name, "Basic (optional reversed card)");
    assert_eq!(response.schema.field_count, 3);
    assert_eq!(response.schema.source, SchemaSource::Detected);

    let notes = state.collection.notes_in_container(response.deck.id).unwrap();
    assert_eq!(notes[0].fields, vec!["Q1", "A1", ""]);
    assert_eq!(notes[1].fields, vec!["Q2", "A2", "extra"]);
    assert!(notes[1].tags.is_empty());
}

#[test]
fn test_directive_selects_schema_and_override_beats_it() {
    let (_db, state) = create_test_state().unwrap();
    let raw = "#notetype: Basic (reversed)\n\nFront,Back\nq,a";

    let response = state
        .import_api
        .quick_import(raw, &ImportRequest::default())
        .unwrap();
    assert_eq!(response.schema.schema.name, "Basic (and reversed card)");
    assert_eq!(response.schema.source, SchemaSource::Directive);
    assert_eq!(response.outcome.added, 2);

    let response = state
        .import_api
        .quick_import(raw, &request_with_override("Cloze", false))
        .unwrap();
    assert_eq!(response.schema.schema.name, "Cloze");
    assert_eq!(response.schema.source, SchemaSource::Override);
}

#[test]
fn test_unknown_directive_falls_back_to_detection() {
    let (_db, state) = create_test_state().unwrap();
    let raw = "#notetype: Vocabulary\nFront,Back\nq,a";

    let response = state
        .import_api
        .quick_import(raw, &ImportRequest::default())
        .unwrap();
    assert_eq!(response.schema.schema.name, "Basic");
    assert_eq!(response.schema.source, SchemaSource::Detected);
}

#[test]
fn test_unknown_override_is_rejected_before_any_note() {
    let (_db, state) = create_test_state().unwrap();
    let deck = state.collection.current_container().unwrap().unwrap();

    let err = state
        .import_api
        .quick_import("q,a", &request_with_override("Nope", false))
        .unwrap_err();
    assert!(matches!(&err, ApiError::UnknownSchema(name) if name == "Nope"));
    assert_eq!(err.user_message(), "Unknown note type: Nope");
    assert!(state.collection.notes_in_container(deck.id).unwrap().is_empty());
}

#[test]
fn test_empty_input_and_directive_only_input() {
    let (_db, state) = create_test_state().unwrap();

    let err = state
        .import_api
        .quick_import("  \n\t ", &ImportRequest::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::InputEmpty));
    assert_eq!(
        err.user_message(),
        "Provide CSV via Paste or choose a CSV file first."
    );

    let err = state
        .import_api
        .quick_import("#notetype: Basic", &ImportRequest::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::NoDataRows));
    assert_eq!(err.user_message(), "No data rows found.");
}

#[test]
fn test_named_deck_is_resolved_and_selected() {
    let (_db, state) = create_test_state().unwrap();
    let lang = state.import_api.create_subdeck("", "Lang").unwrap();
    state
        .collection
        .select_container(state.collection.list_containers().unwrap()[0].id)
        .unwrap();

    let request = ImportRequest {
        container: ContainerSelection::ByName("Lang".to_string()),
        ..request_with_override("Basic", false)
    };
    let response = state.import_api.quick_import("chat,cat", &request).unwrap();
    assert_eq!(response.deck, lang);
    assert_eq!(state.import_api.current_container().unwrap(), Some(lang.clone()));
    assert_eq!(state.collection.notes_in_container(lang.id).unwrap().len(), 1);

    let missing = ImportRequest {
        container: ContainerSelection::ByName("Missing".to_string()),
        ..Default::default()
    };
    let err = state.import_api.quick_import("q,a", &missing).unwrap_err();
    assert!(matches!(err, ApiError::ContainerUnresolved));
}

#[test]
fn test_fixed_delimiter_skips_detection_message() {
    let (_db, state) = create_test_state().unwrap();
    let request = ImportRequest {
        delimiter_mode: DelimiterMode::Fixed(Delimiter::Semicolon),
        ..Default::default()
    };

    let response = state.import_api.quick_import("a;b\nc;d", &request).unwrap();
    assert_eq!(response.outcome.delimiter, Delimiter::Semicolon);
    assert!(!response.delimiter_auto_detected);
    assert_eq!(
        render_outcome(&response),
        "Import complete!\n\nAdded: 2 note(s) to deck 'Default'"
    );
}

// ==========================================
// 失败注入（MockHost）
// ==========================================

#[test]
fn test_record_failure_aborts_and_keeps_earlier_notes() {
    let mut host = MockHost::stock();
    host.fail_on_add = Some(2);
    let api = ImportApi::new(host);

    let err = api
        .quick_import("q1,a1\nq2,a2\nq3,a3", &request_with_override("Basic", false))
        .unwrap_err();
    assert!(matches!(err, ApiError::ImportFailed(_)));
    assert_eq!(api.host().saved_notes().len(), 1);
}

#[test]
fn test_unreadable_override_schema_is_not_found() {
    let mut host = MockHost::stock();
    host.unreadable = vec![1];
    let api = ImportApi::new(host);

    let err = api
        .quick_import("q,a", &request_with_override("Basic", false))
        .unwrap_err();
    assert!(matches!(err, ApiError::SchemaNotFound));
    assert_eq!(err.user_message(), "Selected note type not found.");
}

#[test]
fn test_missing_current_deck_is_unresolved() {
    let api = ImportApi::new(MockHost::stock().without_current_deck());

    let err = api.quick_import("q,a", &ImportRequest::default()).unwrap_err();
    assert!(matches!(err, ApiError::ContainerUnresolved));
    assert_eq!(err.user_message(), "Could not resolve target deck.");
}

#[test]
fn test_target_deck_selected_before_import() {
    let api = ImportApi::new(MockHost::stock().without_current_deck());
    let request = ImportRequest {
        container: ContainerSelection::ById(1),
        ..Default::default()
    };

    let response = api
        .quick_import("{{c1::Paris}} is in France,geography", &request)
        .unwrap();
    assert_eq!(response.schema.schema.name, "Cloze");
    assert_eq!(api.host().current_id(), Some(1));

    let notes = api.host().saved_notes();
    assert_eq!(notes[0].0.fields(), ["{{c1::Paris}} is in France", "geography"]);
}

// ==========================================
// 内容分析 / 状态栏
// ==========================================

#[test]
fn test_analyze_empty_input_clears_status() {
    let (_db, state) = create_test_state().unwrap();
    assert!(state
        .import_api
        .analyze_content(" \n ", AnalysisOptions::default())
        .is_none());
}

#[test]
fn test_analyze_detects_format_and_suggests_schema() {
    let (_db, state) = create_test_state().unwrap();

    let analysis = state
        .import_api
        .analyze_content("Front,Back\nQ1,A1\nQ2,A2", AnalysisOptions::default())
        .unwrap();
    assert_eq!(analysis.delimiter(), Some(Delimiter::Comma));
    assert!(matches!(
        analysis.format,
        FormatStatus::Detected { format, auto: true } if format.row_count == 3
    ));
    let choice = analysis.schema.as_ref().unwrap();
    assert_eq!(choice.schema.name, "Basic");
    assert_eq!(choice.source, SchemaSource::Detected);

    assert_eq!(
        render_status(&analysis),
        "✓ Detected: Comma (,) delimiter • 3 row(s) • Note type: Basic (2 field(s))"
    );
}

#[test]
fn test_analyze_reports_directive_schema() {
    let (_db, state) = create_test_state().unwrap();

    let analysis = state
        .import_api
        .analyze_content("#notetype: cloze\n\nText,Extra\nx,y", AnalysisOptions::default())
        .unwrap();
    assert_eq!(analysis.directives.notetype(), Some("cloze"));
    assert_eq!(analysis.body, "Text,Extra\nx,y");
    assert_eq!(
        render_status(&analysis),
        "✓ Detected: Comma (,) delimiter • 2 row(s) • Note type: Cloze (2 field(s), via directive)"
    );
}

#[test]
fn test_analyze_fixed_mode_counts_rows_with_given_delimiter() {
    let (_db, state) = create_test_state().unwrap();
    let options = AnalysisOptions {
        delimiter_mode: DelimiterMode::Fixed(Delimiter::Tab),
        header_hint: false,
    };

    let analysis = state
        .import_api
        .analyze_content("a\tb\nc\td", options)
        .unwrap();
    assert!(matches!(
        analysis.format,
        FormatStatus::Detected { format, auto: false }
            if format.delimiter == Delimiter::Tab && format.row_count == 2
    ));
    assert!(render_status(&analysis).starts_with("✓ Detected: Tab delimiter • 2 row(s)"));
}

#[test]
fn test_failed_detection_status() {
    let analysis = ContentAnalysis {
        directives: Directives::new(),
        body: "x".to_string(),
        format: FormatStatus::Failed {
            message: "bad input".to_string(),
        },
        schema: None,
    };
    assert_eq!(analysis.delimiter(), None);
    assert_eq!(render_status(&analysis), "⚠ Detection failed: bad input");
}

#[test]
fn test_configured_sample_rows_change_suggestion() {
    let (_db, state) = create_test_state().unwrap();
    let raw = "q1,a1\nq2,a2,x\nq3,a3,y";

    let before = state
        .import_api
        .analyze_content(raw, AnalysisOptions::default())
        .unwrap();
    assert_eq!(
        before.schema.unwrap().schema.name,
        "Basic (optional reversed card)"
    );

    state
        .config
        .set_global_config_value("schema_sample_rows", "1")
        .unwrap();
    assert_eq!(state.import_api.detection_settings().schema_sample_rows, 1);

    let after = state
        .import_api
        .analyze_content(raw, AnalysisOptions::default())
        .unwrap();
    assert_eq!(after.schema.unwrap().schema.name, "Basic");
}

// ==========================================
// 子牌组
// ==========================================

#[test]
fn test_create_subdeck_collapses_whitespace_and_selects() {
    let (_db, state) = create_test_state().unwrap();

    let deck = state
        .import_api
        .create_subdeck("Default", "  Verbs   Irregular ")
        .unwrap();
    assert_eq!(deck.name, "Default::Verbs Irregular");
    assert_eq!(state.import_api.current_container().unwrap(), Some(deck.clone()));
    assert_eq!(
        render_subdeck_created(&deck),
        "✓ Created subdeck: Default::Verbs Irregular"
    );

    let again = state
        .import_api
        .create_subdeck("Default", "Verbs Irregular")
        .unwrap();
    assert_eq!(again.id, deck.id);

    let top = state.import_api.create_subdeck("  ", "Solo").unwrap();
    assert_eq!(top.name, "Solo");
}

#[test]
fn test_create_subdeck_requires_name() {
    let (_db, state) = create_test_state().unwrap();

    let err = state.import_api.create_subdeck("Default", "   ").unwrap_err();
    assert!(matches!(err, ApiError::SubdeckNameEmpty));
    assert_eq!(err.user_message(), "Enter a subdeck name first.");
}
