mod common;

use common::TestWorkspace;
use gradeledger::{
    aggregate::aggregate_directory,
    error::LedgerError,
    ledger::Ledger,
    merge::{FieldUpdate, GradeEntry, record_batch, record_update},
};

#[test]
fn recording_into_a_missing_ledger_creates_it_with_base_columns() {
    let workspace = TestWorkspace::new();
    let path = workspace.file("grades1.csv");

    let update = GradeEntry {
        name: "Alice".to_string(),
        answers: vec!["3".to_string()],
        overall: Some("3".to_string()),
        feedback: Some("Good".to_string()),
        submission_time: None,
    }
    .into_update();
    let outcome = record_update(&path, b',', &update).expect("record");

    assert!(outcome.created_row);
    assert_eq!(
        workspace.read("grades1.csv"),
        "Name,SubmissionTime,Feedback,Overall,Q1\nAlice,,Good,3,3\n"
    );
}

#[test]
fn partial_update_leaves_other_students_and_fields_untouched() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "grades2.csv",
        "Name,SubmissionTime,Feedback,Overall,Q1,Q2\nAlice,t1,ok,3,3,2\nBob,t2,fine,2,2,1\n",
    );

    let update = FieldUpdate::new("  Bob ").set("Q2", "3");
    let outcome = record_update(&path, b',', &update).expect("record");

    assert!(!outcome.created_row);
    assert!(outcome.added_columns.is_empty());
    assert_eq!(
        workspace.read("grades2.csv"),
        "Name,SubmissionTime,Feedback,Overall,Q1,Q2\nAlice,t1,ok,3,3,2\nBob,t2,fine,2,2,3\n"
    );
}

#[test]
fn matched_row_takes_the_supplied_trimmed_name() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("grades1.csv", "Name,Overall\nalice smith,3\n");

    record_update(&path, b',', &FieldUpdate::new(" Alice Smith ").overall("4")).expect("record");

    let ledger = workspace.ledger("grades1.csv");
    assert_eq!(ledger.row_count(), 1);
    assert_eq!(ledger.rows()[0][0], "Alice Smith");
}

#[test]
fn merge_reuses_base_columns_spelled_in_another_case() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("grades1.csv", "name,overall,Q1\nAlice,3,7\nBob,2,5\n");

    let outcome =
        record_update(&path, b',', &FieldUpdate::new("Alice").feedback("Good")).expect("record");

    assert!(!outcome.created_row);
    assert_eq!(outcome.added_columns, ["SubmissionTime", "Feedback"]);
    let ledger = workspace.ledger("grades1.csv");
    assert_eq!(
        ledger.headers(),
        ["name", "SubmissionTime", "Feedback", "overall", "Q1"]
    );
    assert_eq!(ledger.row_count(), 2);
    assert_eq!(ledger.rows()[0], ["Alice", "", "Good", "3", "7"]);
    assert_eq!(ledger.rows()[1], ["Bob", "", "", "2", "5"]);

    let run = aggregate_directory(workspace.path(), b',').expect("aggregate");
    assert_eq!(run.aggregate.students.len(), 2);
    let alice = &run.aggregate.students[0];
    assert_eq!(alice.identity.label(), "Alice");
    let record = &alice.assignments[&1];
    assert_eq!(record.overall.as_deref(), Some("3"));
    assert_eq!(record.question("Q1"), Some("7"));
}

#[test]
fn question_update_matches_existing_column_case_insensitively() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "grades1.csv",
        "Name,SubmissionTime,Feedback,Overall,q1\nAlice,,,3,7\n",
    );

    let outcome =
        record_update(&path, b',', &FieldUpdate::new("Alice").question(1, "9")).expect("record");

    assert!(outcome.added_columns.is_empty());
    let ledger = workspace.ledger("grades1.csv");
    assert_eq!(ledger.value_by_name(0, "q1"), Some("9"));
}

#[test]
fn ledger_with_repeated_column_is_left_untouched() {
    let workspace = TestWorkspace::new();
    let original = "Name,Q1,Q1\nAlice,1,2\n";
    let path = workspace.write("grades1.csv", original);

    let err = record_update(&path, b',', &FieldUpdate::new("Alice").overall("3")).unwrap_err();

    assert!(matches!(err, LedgerError::DuplicateColumn { ref column, .. } if column == "Q1"));
    assert_eq!(workspace.read("grades1.csv"), original);
}

#[test]
fn new_question_column_is_placed_in_numeric_order() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "grades1.csv",
        "Name,SubmissionTime,Feedback,Overall,Q1,Q3,Notes\nAlice,,,3,1,3,late\n",
    );

    record_update(&path, b',', &FieldUpdate::new("Alice").question(2, "2")).expect("record");

    let ledger = workspace.ledger("grades1.csv");
    assert_eq!(
        ledger.headers(),
        ["Name", "SubmissionTime", "Feedback", "Overall", "Q1", "Q2", "Q3", "Notes"]
    );
    assert_eq!(ledger.rows()[0], ["Alice", "", "", "3", "1", "2", "3", "late"]);
}

#[test]
fn multiline_feedback_and_short_rows_survive_a_save() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "grades1.csv",
        "Name,SubmissionTime,Feedback,Overall\n\"Alice\",,\"Line one\n\nLine, two\",3\nBob\n",
    );

    let ledger = Ledger::load(&path, b',').expect("load");
    assert_eq!(ledger.rows()[1], ["Bob", "", "", ""]);
    ledger.save(&path, b',').expect("save");

    let reloaded = workspace.ledger("grades1.csv");
    assert_eq!(reloaded, ledger);
    assert_eq!(reloaded.value_by_name(0, "Feedback"), Some("Line one\n\nLine, two"));
}

#[test]
fn batch_keeps_going_after_a_failed_student() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("grades1.csv", "Name,Overall\nAlice,1\n");

    let updates = vec![
        FieldUpdate::new("Alice").overall("4"),
        FieldUpdate::new("   ").overall("2"),
        FieldUpdate::new("Carol").overall("3"),
    ];
    let report = record_batch(&path, b',', &updates);

    assert!(!report.is_clean());
    assert_eq!(report.applied.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, LedgerError::MissingName { .. }));

    let ledger = workspace.ledger("grades1.csv");
    let names = ledger
        .rows()
        .iter()
        .map(|row| row[0].as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["Alice", "Carol"]);
}

#[test]
fn unreadable_ledger_error_names_the_file() {
    let workspace = TestWorkspace::new();
    let path = workspace.file("missing/grades1.csv");

    let err = Ledger::load(&path, b',').unwrap_err();
    assert!(matches!(err, LedgerError::Io { .. }));
    assert!(err.to_string().contains("grades1.csv"));
}
