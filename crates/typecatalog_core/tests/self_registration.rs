use typecatalog_core::{
    bootstrap, catalog, register_type, request_capability, Registry, Request, TypeKind,
};

trait Drawable {
    fn draw(&self) -> String;
}

#[derive(Debug, Default)]
struct Widget {
    strokes: u32,
}

impl Drawable for Widget {
    fn draw(&self) -> String {
        format!("widget strokes={}", self.strokes)
    }
}

#[derive(Debug, Default)]
struct Sprocket;

#[derive(Debug, Default)]
struct PingRequest {
    attempts: u8,
}

impl Request for PingRequest {
    fn is_request(&self) -> bool {
        true
    }
}

register_type!(Widget in "shapes", capabilities: [dyn Drawable]);
register_type!(Sprocket in "shapes");
register_type!(PingRequest, reference_capabilities: [dyn Request]);

#[test]
fn declared_types_appear_in_the_process_catalog() {
    let widget = catalog().lookup("shapes.Widget").expect("widget declared");
    assert_eq!(widget.kind(), TypeKind::Value);
    assert!(widget.satisfies_contract::<dyn Drawable>());

    let reference = catalog().lookup("shapes.*Widget").expect("reference widget");
    assert!(reference.satisfies_contract::<dyn Drawable>());

    assert!(catalog()
        .lookup_by_substring("idget")
        .iter()
        .any(|descriptor| descriptor.qualified_name() == "shapes.Widget"));
}

#[test]
fn namespace_defaults_to_module_path() {
    let namespace = module_path!();
    let request = catalog()
        .lookup_in_namespace(namespace, "*PingRequest")
        .expect("request declared under module path");
    assert!(request.satisfies(request_capability()));
    assert_eq!(
        request.qualified_name(),
        format!("{namespace}.*PingRequest")
    );
}

#[test]
fn request_filter_includes_contract_base_and_declared_requests() {
    let requests = catalog().implementing(request_capability());
    let names: Vec<&str> = requests
        .iter()
        .map(|descriptor| descriptor.qualified_name())
        .collect();

    assert!(names.contains(&"contracts.*BaseRequest"));
    assert!(names.iter().any(|name| name.ends_with(".*PingRequest")));
    assert!(!names.iter().any(|name| name.starts_with("shapes.")));
}

#[test]
fn process_catalog_instantiates_without_static_references() {
    let name = format!("{}.*PingRequest", module_path!());
    let mut first = catalog()
        .new_instance_if_capable(&name, request_capability())
        .expect("ping request instance");
    let second = catalog().new_instance(&name).expect("second instance");

    first
        .write::<PingRequest, _>(|request| request.attempts = 3)
        .expect("ping request");
    assert_eq!(second.read::<PingRequest, _>(|request| request.attempts), Some(0));
    assert_eq!(
        first.with_capability::<dyn Request, _>(|request| request.is_request()),
        Some(true)
    );
}

#[test]
fn bootstrap_replays_into_private_registries() {
    let registry = Registry::new();
    let applied = bootstrap(&registry);

    assert!(applied >= 5);
    assert_eq!(registry.all_in_namespace("shapes").len(), 4);
    assert!(registry.lookup("contracts.*BaseNotification").is_ok());
}

#[test]
fn late_registration_extends_the_process_catalog() {
    #[derive(Default)]
    struct Plugin;

    catalog().register_pair(
        "plugins",
        "Plugin",
        typecatalog_core::Shape::of::<Plugin>().build(),
    );
    assert!(catalog().lookup("plugins.*Plugin").is_ok());
    assert_eq!(catalog().all_in_namespace("plugins").len(), 2);
}
