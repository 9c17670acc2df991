//! Quick-entry pass against the in-memory store and the heuristic
//! classifier.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use gleaner_core::{ContentNode, DateValue, DocumentStore, PropertyMap, PropertyValue};
use gleaner_inference::HeuristicClassifier;
use gleaner_jobs::{CycleContext, EngineConfig, Pass, QuickEntryPass};
use gleaner_store::{FaultKind, InMemoryStore, StoreOp};

const NOTES: &str = "notes";
const TASKS: &str = "tasks";
const KNOWLEDGE: &str = "knowledge";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn ctx(cycle: u64) -> CycleContext {
    CycleContext::new(cycle, Utc::now()).with_today(today())
}

fn titled(title: &str) -> PropertyMap {
    let mut props = PropertyMap::new();
    props.insert("Name".to_string(), PropertyValue::Title(title.to_string()));
    props
}

fn setup() -> (Arc<InMemoryStore>, QuickEntryPass) {
    let store = Arc::new(InMemoryStore::new());
    let classifier = Arc::new(HeuristicClassifier::default().with_today(today()));
    let pass = QuickEntryPass::new(
        store.clone(),
        classifier,
        EngineConfig::new(NOTES, TASKS, KNOWLEDGE),
    );
    (store, pass)
}

fn quick_add(text: &str) -> PropertyMap {
    let mut props = titled("");
    props.insert("Quick Add".to_string(), PropertyValue::Text(text.to_string()));
    props
}

fn knowledge_page(store: &InMemoryStore, project: &str) -> String {
    let page = store.insert_record(KNOWLEDGE, titled(project));
    store.set_children(
        &page,
        vec![
            ContentNode::heading("k-cred", 2, "Credentials"),
            ContentNode::heading("k-contacts", 2, "Contacts"),
            ContentNode::heading("k-links", 2, "Important Links"),
            ContentNode::heading("k-dec", 2, "Decisions Log"),
        ],
    );
    page
}

#[tokio::test]
async fn test_info_only_entry_is_routed_and_archived() {
    let (store, pass) = setup();
    knowledge_page(&store, "HubSpot");

    let entry = store.insert_record(TASKS, titled("untitled"));
    store.set_children(
        &entry,
        vec![
            ContentNode::heading("h1", 2, "Project Info"),
            ContentNode::bullet("b1", "HubSpot password is hunter2"),
        ],
    );

    let report = pass.run(&ctx(1)).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.archived, 1);
    assert_eq!(report.knowledge_routed, 1);

    let appends = store.appends();
    assert_eq!(appends.len(), 1);
    assert_eq!(appends[0].after_id, "k-cred");
    assert_eq!(appends[0].lines, vec!["HubSpot password is hunter2"]);
    assert!(store.record(&entry).unwrap().archived);

    // Archived records are no longer listed.
    let report = pass.run(&ctx(2)).await.unwrap();
    assert_eq!(report.examined, 0);
}

#[tokio::test]
async fn test_both_channels_fill_record_and_remove_info_section() {
    let (store, pass) = setup();
    knowledge_page(&store, "Finance");

    let mut props = titled("untitled");
    props.insert(
        "Quick Add".to_string(),
        PropertyValue::Text(
            "Call Acme about renewal friday\nSend HubSpot renewal quote".to_string(),
        ),
    );
    let entry = store.insert_record(TASKS, props);
    store.set_children(
        &entry,
        vec![
            ContentNode::heading("h1", 2, "Project Info"),
            ContentNode::bullet("b1", "Budget sheet https://sheets.acme.io/budget"),
            ContentNode::heading("h2", 2, "Notes"),
            ContentNode::paragraph("p1", "Keep this"),
        ],
    );

    let report = pass.run(&ctx(1)).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.archived, 0);
    assert_eq!(report.tasks_created, 1);
    assert_eq!(report.knowledge_routed, 1);

    let record = store.record(&entry).unwrap();
    assert!(!record.archived);
    assert_eq!(record.text("Name"), Some("Call Acme about renewal friday"));
    assert_eq!(record.select("Priority"), Some("Medium"));
    assert_eq!(record.select("Status"), Some("Backlog"));
    assert_eq!(
        record.date("Due"),
        Some(DateValue::Day(NaiveDate::from_ymd_opt(2026, 10, 23).unwrap()))
    );
    assert_eq!(record.text("Quick Add"), Some(""));

    let sibling = store
        .records(TASKS)
        .into_iter()
        .find(|r| r.id != entry)
        .unwrap();
    assert_eq!(sibling.text("Name"), Some("Send HubSpot renewal quote"));
    assert_eq!(sibling.select("Project"), Some("HubSpot"));
    assert!(!sibling.properties.contains_key("Source Document"));

    let remaining: Vec<String> = store.children(&entry).into_iter().map(|n| n.id).collect();
    assert_eq!(remaining, vec!["h2", "p1"]);

    let appends = store.appends();
    assert_eq!(appends.len(), 1);
    assert_eq!(appends[0].after_id, "k-links");
}

#[tokio::test]
async fn test_failed_info_channel_leaves_record_and_cools_down() {
    let (store, pass) = setup();

    // Nothing names a project, so routing targets the fallback page,
    // which does not exist.
    let entry = store.insert_record(TASKS, titled("untitled"));
    store.set_children(
        &entry,
        vec![
            ContentNode::heading("h1", 2, "Project Info"),
            ContentNode::bullet("b1", "Remember the offsite"),
        ],
    );

    for cycle in 1..=3 {
        let report = pass.run(&ctx(cycle)).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.archived, 0);
    }
    assert_eq!(pass.tracker().failures(&entry), 3);

    let record = store.record(&entry).unwrap();
    assert!(!record.archived);
    assert_eq!(store.children(&entry).len(), 2);

    let fetches = store.call_count(StoreOp::ListChildren);
    let report = pass.run(&ctx(4)).await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(store.call_count(StoreOp::ListChildren), fetches);
}

#[tokio::test]
async fn test_entry_without_channels_is_a_noop() {
    let (store, pass) = setup();
    let entry = store.insert_record(TASKS, titled("untitled"));

    let report = pass.run(&ctx(1)).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.processed, 0);
    assert_eq!(store.call_count(StoreOp::Update), 0);
    assert!(!store.record(&entry).unwrap().archived);
}

#[tokio::test]
async fn test_filled_in_task_is_not_a_quick_entry() {
    let (store, pass) = setup();
    let mut props = titled("Prepare board deck");
    props.insert(
        "Quick Add".to_string(),
        PropertyValue::Text("Book venue".to_string()),
    );
    store.insert_record(TASKS, props);

    let report = pass.run(&ctx(1)).await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(store.records(TASKS).len(), 1);
    assert_eq!(store.call_count(StoreOp::Update), 0);
}

#[tokio::test]
async fn test_short_task_with_pending_info_is_never_archived() {
    let (store, pass) = setup();
    let entry = store.insert_record(TASKS, quick_add("Call"));
    store.set_children(
        &entry,
        vec![
            ContentNode::heading("h1", 2, "Project Info"),
            ContentNode::bullet("b1", "Remember the offsite"),
        ],
    );

    // No "General" page yet, so the info channel fails.
    let report = pass.run(&ctx(1)).await.unwrap();
    assert_eq!(report.failed, 1);
    let record = store.record(&entry).unwrap();
    assert_eq!(record.text("Name"), Some("Call"));
    assert_eq!(record.text("Quick Add"), Some(""));
    assert!(record.checkbox("Info Pending"));
    assert_eq!(store.children(&entry).len(), 2);

    knowledge_page(&store, "General");
    let report = pass.run(&ctx(2)).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.archived, 0);
    assert_eq!(report.knowledge_routed, 1);

    let record = store.record(&entry).unwrap();
    assert!(!record.archived);
    assert!(!record.checkbox("Info Pending"));
    assert_eq!(record.text("Name"), Some("Call"));
    assert!(store.children(&entry).is_empty());
    assert_eq!(store.appends()[0].after_id, "k-dec");
}

#[tokio::test]
async fn test_filled_task_retries_pending_info() {
    let (store, pass) = setup();
    let entry = store.insert_record(
        TASKS,
        quick_add("Call the bank about the invoice tomorrow"),
    );
    store.set_children(
        &entry,
        vec![
            ContentNode::heading("h1", 2, "Project Info"),
            ContentNode::bullet("b1", "Remember the offsite"),
        ],
    );

    let report = pass.run(&ctx(1)).await.unwrap();
    assert_eq!(report.failed, 1);
    let record = store.record(&entry).unwrap();
    assert_eq!(record.select("Project"), Some("Finance"));
    assert_eq!(record.select("Priority"), Some("Medium"));
    assert!(record.checkbox("Info Pending"));

    // Project and priority are set, so only the pending marker lists it.
    knowledge_page(&store, "General");
    let report = pass.run(&ctx(2)).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.processed, 1);
    assert_eq!(report.archived, 0);

    let appends = store.appends();
    assert_eq!(appends.len(), 1);
    assert_eq!(appends[0].lines, vec!["Remember the offsite"]);
    assert!(store.children(&entry).is_empty());
    let record = store.record(&entry).unwrap();
    assert!(!record.archived);
    assert!(!record.checkbox("Info Pending"));

    let report = pass.run(&ctx(3)).await.unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(store.appends().len(), 1);
}

#[tokio::test]
async fn test_undeletable_info_node_is_skipped() {
    let (store, pass) = setup();
    knowledge_page(&store, "Finance");

    let entry = store.insert_record(TASKS, quick_add("Pay the invoice"));
    store.set_children(
        &entry,
        vec![
            ContentNode::heading("h1", 2, "Project Info"),
            ContentNode::bullet("b1", "Budget sheet https://sheets.acme.io/budget"),
            ContentNode::bullet("b2", "Invoices go to Dana"),
            ContentNode::heading("h2", 2, "Notes"),
            ContentNode::paragraph("p1", "Keep this"),
        ],
    );
    store.fail_target(StoreOp::DeleteNode, "b1", FaultKind::Permanent);

    let report = pass.run(&ctx(1)).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.knowledge_routed, 2);
    assert_eq!(store.call_count(StoreOp::DeleteNode), 3);

    let remaining: Vec<String> = store.children(&entry).into_iter().map(|n| n.id).collect();
    assert_eq!(remaining, vec!["b1", "h2", "p1"]);
    assert!(!store.record(&entry).unwrap().archived);
}

#[tokio::test]
async fn test_failures_of_unlisted_records_are_forgotten() {
    let (store, pass) = setup();
    let entry = store.insert_record(TASKS, titled("untitled"));
    store.set_children(
        &entry,
        vec![
            ContentNode::heading("h1", 2, "Project Info"),
            ContentNode::bullet("b1", "Remember the offsite"),
        ],
    );

    let report = pass.run(&ctx(1)).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(pass.tracker().failures(&entry), 1);

    // Someone archives the entry by hand.
    store.archive(&entry).await.unwrap();

    let report = pass.run(&ctx(2)).await.unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(pass.tracker().failures(&entry), 0);
    assert!(pass.tracker().is_empty());
}
