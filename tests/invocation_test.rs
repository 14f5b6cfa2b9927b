//! Program invocation through `SessionManager` against an in-process host

mod common;

use common::{Host, MockPool};
use once_cell::sync::Lazy;
use progcall::interface::{Credentials, Endpoint, ParamValue, ProgramBinding};
use progcall::marshal::{
    node_element, Error, FieldDescriptor, Mapped, Mapping, ProgramDefinition, Record, RecordCall,
    RemoteProgram, Slot, Usage,
};
use progcall::{Config, ErrorCategory, SessionManager};
use tempfile::TempDir;

#[derive(Debug, Default, Clone, PartialEq)]
struct Item {
    id: i64,
}

impl Mapped for Item {
    fn mapping() -> &'static Mapping<Self> {
        static MAPPING: Lazy<Mapping<Item>> = Lazy::new(|| {
            Mapping::<Item>::builder()
                .scalar("id", "ID", Usage::Output, |i| &i.id, |i| &mut i.id)
                .build()
        });
        &MAPPING
    }
}

node_element!(Item);

#[derive(Debug, Default)]
struct Order {
    count: i64,
    items: Vec<Item>,
}

impl Mapped for Order {
    fn mapping() -> &'static Mapping<Self> {
        static MAPPING: Lazy<Mapping<Order>> = Lazy::new(|| {
            Mapping::<Order>::builder()
                .scalar("count", "CNT", Usage::InputOutput, |o| &o.count, |o| &mut o.count)
                .structure_array("items", "ITEM", Usage::Output, 3, |o| &o.items, |o| {
                    &mut o.items
                })
                .build()
        });
        &MAPPING
    }
}

impl RemoteProgram for Order {
    fn binding(&self) -> Option<ProgramBinding> {
        Some(ProgramBinding::new("ORDPGM", "schemas/ordpgm"))
    }

    fn descriptors(&self) -> &[FieldDescriptor] {
        Order::mapping().descriptors()
    }
}

fn manager(pool: MockPool) -> SessionManager<MockPool> {
    SessionManager::new(
        pool,
        Endpoint::new("host.test"),
        Credentials::new("QUSER", "secret"),
    )
}

fn host_with_items() -> Host {
    let host = Host::new();
    for (i, id) in [101, 102, 103].into_iter().enumerate() {
        host.preset("ORDPGM.ITEM.ID", &[i], id);
    }
    host
}

fn order_definition() -> ProgramDefinition {
    ProgramDefinition {
        program: "ORDPGM".to_string(),
        document: "schemas/ordpgm".to_string(),
        fields: vec![
            FieldDescriptor::scalar("count", "CNT", Usage::InputOutput),
            FieldDescriptor::structure_array(
                "items",
                "ITEM",
                Usage::Output,
                3,
                vec![FieldDescriptor::scalar("id", "ID", Usage::Output)],
            ),
        ],
    }
}

#[tokio::test]
async fn test_typed_call_writes_count_and_reads_items() {
    let host = host_with_items();
    let manager = manager(MockPool::new(host.clone()));
    let mut order = Order {
        count: 5,
        items: Vec::new(),
    };

    manager.invoke_program(&mut order).await.unwrap();

    assert_eq!(order.count, 5);
    assert_eq!(
        order.items,
        vec![Item { id: 101 }, Item { id: 102 }, Item { id: 103 }]
    );
    assert_eq!(host.written_paths(), vec!["ORDPGM.CNT"]);
    assert_eq!(host.value("ORDPGM.CNT", &[]), Some(ParamValue::Int(5)));
    assert_eq!(host.state().calls, vec!["ORDPGM"]);
    assert_eq!(host.state().bindings[0].document, "schemas/ordpgm");
    assert_eq!(manager.pool().acquired(), 1);
    assert_eq!(manager.pool().released(), 1);
}

#[tokio::test]
async fn test_record_call_round_trips_through_definition() {
    let host = host_with_items();
    let manager = manager(MockPool::new(host.clone()));
    let mut call = RecordCall::new(order_definition(), Record::new().with("count", 5));

    manager.invoke_program(&mut call).await.unwrap();

    let record = call.into_record();
    assert_eq!(record.get("count"), Some(&Slot::from(5)));
    match record.get("items") {
        Some(Slot::List(items)) => {
            assert_eq!(items.len(), 3);
            assert_eq!(items[2], Slot::from(Record::new().with("id", 103)));
        }
        other => panic!("items not rebuilt: {:?}", other),
    }
}

#[tokio::test]
async fn test_input_fields_are_never_read_back() {
    let host = host_with_items();
    host.returns("ORDPGM.CNT", &[], 77);
    let manager = manager(MockPool::new(host.clone()));
    let definition = ProgramDefinition {
        fields: vec![
            FieldDescriptor::scalar("customer", "CUS", Usage::Input),
            FieldDescriptor::scalar("count", "CNT", Usage::InputOutput),
        ],
        ..order_definition()
    };
    let mut call = RecordCall::new(
        definition,
        Record::new().with("customer", "ACME").with("count", 1),
    );

    manager.invoke_program(&mut call).await.unwrap();

    assert_eq!(host.written_paths(), vec!["ORDPGM.CUS", "ORDPGM.CNT"]);
    assert_eq!(host.state().writes[1], ("ORDPGM.CNT".to_string(), vec![]));
    assert_eq!(host.read_paths(), vec!["ORDPGM.CNT"]);
    let record = call.into_record();
    assert_eq!(record.get("customer"), Some(&Slot::from("ACME")));
    assert_eq!(record.get("count"), Some(&Slot::from(77)));
}

#[tokio::test]
async fn test_diagnostics_are_joined_into_one_failure() {
    let host = host_with_items();
    host.respond_with(&["A", "B"]);
    let manager = manager(MockPool::new(host.clone()));
    let mut order = Order::default();

    let err = manager.invoke_program(&mut order).await.unwrap_err();

    assert_eq!(err.remote_text(), Some("A\nB"));
    assert_eq!(err.category(), ErrorCategory::Remote);
    assert_eq!(err.target, "ORDPGM");
    assert!(err.release_failure.is_none());
    assert!(host.read_paths().is_empty());
    assert!(order.items.is_empty());
    assert_eq!(manager.pool().released(), 1);
}

#[tokio::test]
async fn test_session_released_when_marshalling_fails() {
    let host = Host::new();
    let manager = manager(MockPool::new(host.clone()));
    let mut call = RecordCall::new(order_definition(), Record::new());

    let err = manager.invoke_program(&mut call).await.unwrap_err();

    assert!(matches!(err.cause, Error::Access { ref path, .. } if path == "ORDPGM.CNT"));
    assert!(host.state().calls.is_empty());
    assert_eq!(manager.pool().acquired(), 1);
    assert_eq!(manager.pool().released(), 1);
}

#[tokio::test]
async fn test_session_released_when_unmarshalling_fails() {
    // No ITEM.ID values on the host: the read pass fails after the call
    let host = Host::new();
    let manager = manager(MockPool::new(host.clone()));
    let mut order = Order {
        count: 1,
        items: Vec::new(),
    };

    let err = manager.invoke_program(&mut order).await.unwrap_err();

    assert!(matches!(err.cause, Error::Document(_)));
    assert_eq!(err.category(), ErrorCategory::Document);
    assert_eq!(host.state().calls, vec!["ORDPGM"]);
    assert_eq!(manager.pool().released(), 1);
}

#[tokio::test]
async fn test_release_failure_rides_along_with_the_cause() {
    let host = host_with_items();
    host.respond_with(&["CPF9801 Object not found"]);
    let mut pool = MockPool::new(host);
    pool.fail_release = true;
    let manager = manager(pool);
    let mut order = Order::default();

    let err = manager.invoke_program(&mut order).await.unwrap_err();

    assert_eq!(err.remote_text(), Some("CPF9801 Object not found"));
    assert!(err.release_failure.is_some());
    assert!(err.to_string().contains("session release also failed"));
    assert_eq!(manager.pool().released(), 1);
}

#[tokio::test]
async fn test_release_failure_after_success_is_the_error() {
    let mut pool = MockPool::new(host_with_items());
    pool.fail_release = true;
    let manager = manager(pool);
    let mut order = Order::default();

    let err = manager.invoke_program(&mut order).await.unwrap_err();

    assert!(matches!(err.cause, Error::Session(_)));
    assert!(err.is_transient());
    assert!(err.release_failure.is_none());
    // Outputs were already read before the release
    assert_eq!(order.items.len(), 3);
}

#[tokio::test]
async fn test_acquire_failure_releases_nothing() {
    let mut pool = MockPool::new(Host::new());
    pool.fail_acquire = true;
    let manager = manager(pool);
    let mut order = Order::default();

    let err = manager.invoke_program(&mut order).await.unwrap_err();

    assert!(matches!(err.cause, Error::Session(_)));
    assert_eq!(err.category(), ErrorCategory::Session);
    assert_eq!(manager.pool().released(), 0);
}

#[tokio::test]
async fn test_missing_binding_fails_before_acquire() {
    let manager = manager(MockPool::new(Host::new()));
    let definition = ProgramDefinition {
        program: String::new(),
        ..order_definition()
    };
    let mut call = RecordCall::new(definition, Record::new().with("count", 1));

    let err = manager.invoke_program(&mut call).await.unwrap_err();

    assert!(matches!(err.cause, Error::Schema { .. }));
    assert_eq!(manager.pool().acquired(), 0);
}

#[tokio::test]
async fn test_depth_violation_fails_before_acquire() {
    let host = Host::new();
    let manager = manager(MockPool::new(host.clone()));
    let cell = FieldDescriptor::scalar_array("cell", "CELL", Usage::Input, 2);
    let col = FieldDescriptor::structure_array("col", "COL", Usage::Input, 2, vec![cell]);
    let row = FieldDescriptor::structure_array("row", "ROW", Usage::Input, 2, vec![col]);
    let definition = ProgramDefinition {
        program: "GRID".to_string(),
        document: "schemas/grid".to_string(),
        fields: vec![row],
    };
    let mut call = RecordCall::new(definition, Record::new());

    let err = manager.invoke_program(&mut call).await.unwrap_err();

    assert!(matches!(err.cause, Error::PathDepth { max: 2, .. }));
    assert_eq!(err.category(), ErrorCategory::Layout);
    assert_eq!(manager.pool().acquired(), 0);
    assert!(host.written_paths().is_empty());
}

#[tokio::test]
async fn test_concurrent_invocations_take_separate_sessions() {
    let host = host_with_items();
    let manager = manager(MockPool::new(host));
    let mut first = Order {
        count: 1,
        items: Vec::new(),
    };
    let mut second = Order {
        count: 2,
        items: Vec::new(),
    };

    let (a, b) = tokio::join!(
        manager.invoke_program(&mut first),
        manager.invoke_program(&mut second)
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(manager.pool().acquired(), 2);
    assert_eq!(manager.pool().released(), 2);
    assert_eq!(first.items.len(), 3);
    assert_eq!(second.items.len(), 3);
}

fn schema_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.connection.endpoint = "host.test".to_string();
    config.connection.user = "QUSER".to_string();
    config.definitions_dir = Some(dir.path().to_path_buf());
    config
}

#[tokio::test]
async fn test_conforming_call_passes_schema_check() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("ORDPGM.json"),
        serde_json::to_string(&order_definition()).unwrap(),
    )
    .unwrap();
    let manager = SessionManager::from_config(MockPool::new(host_with_items()), &schema_config(&dir));
    let mut order = Order::default();

    manager.invoke_program(&mut order).await.unwrap();

    assert_eq!(order.items.len(), 3);
    assert_eq!(manager.endpoint().host, "host.test");
}

#[tokio::test]
async fn test_nonconforming_call_fails_before_acquire() {
    let dir = TempDir::new().unwrap();
    let remote = ProgramDefinition {
        fields: vec![
            FieldDescriptor::scalar("count", "CNT", Usage::Input),
            FieldDescriptor::structure_array(
                "items",
                "ITEM",
                Usage::Output,
                2,
                vec![FieldDescriptor::scalar("id", "ID", Usage::Output)],
            ),
        ],
        ..order_definition()
    };
    std::fs::write(
        dir.path().join("ORDPGM.json"),
        serde_json::to_string(&remote).unwrap(),
    )
    .unwrap();
    let manager = SessionManager::from_config(MockPool::new(Host::new()), &schema_config(&dir));
    let mut order = Order::default();

    let err = manager.invoke_program(&mut order).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Schema);
    let text = err.cause.to_string();
    assert!(text.contains("ORDPGM.CNT"), "{}", text);
    assert!(text.contains("ORDPGM.ITEM"), "{}", text);
    assert_eq!(manager.pool().acquired(), 0);
}

#[tokio::test]
async fn test_unknown_program_definition_is_a_schema_failure() {
    let dir = TempDir::new().unwrap();
    let manager = SessionManager::from_config(MockPool::new(Host::new()), &schema_config(&dir));
    let mut order = Order::default();

    let err = manager.invoke_program(&mut order).await.unwrap_err();

    assert!(matches!(err.cause, Error::Schema { .. }));
    assert_eq!(manager.pool().acquired(), 0);
}
