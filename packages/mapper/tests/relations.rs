use std::sync::Arc;

use kvmapper::field::{Field, RelatedObjects};
use kvmapper::{
    Client, Criteria, Error, Link, Mapper, Model, ModelBuilder, Object, QueryKind, Registry,
    ValidationError, Value,
};
use kvmapper_memory_store::MemoryBackend;

struct Fixture {
    backend: Arc<MemoryBackend>,
    mapper: Mapper,
    person: Arc<Model>,
    team: Arc<Model>,
}

fn setup() -> Fixture {
    let backend = Arc::new(MemoryBackend::new());
    let mut registry = Registry::new();
    let person = registry
        .register(
            ModelBuilder::new("Person", "users")
                .field("first_name", Field::string().required())
                .field("manager", RelatedObjects::with_backref())
                .field("friends", RelatedObjects::new())
                .field("team", RelatedObjects::new())
                .build()
                .unwrap(),
        )
        .unwrap();
    let team = registry
        .register(
            ModelBuilder::new("Team", "teams")
                .field("name", Field::string().required())
                .build()
                .unwrap(),
        )
        .unwrap();
    let mapper = Mapper::new(Client::new(Arc::clone(&backend)), registry);
    Fixture {
        backend,
        mapper,
        person,
        team,
    }
}

fn person(f: &Fixture, name: &str) -> Object {
    let mut object = Object::with_fields(&f.person, [("first_name", name)]);
    object.save(&f.mapper).unwrap();
    object
}

#[test]
fn test_relationship_round_trip() {
    let f = setup();
    let jane = person(&f, "jane");

    let mut john = Object::with_fields(&f.person, [("first_name", "john")]);
    john.set_related("manager", vec![jane.clone()]);
    john.save(&f.mapper).unwrap();
    assert_eq!(
        john.links(),
        &[Link::new("users", jane.key().unwrap(), "manager")]
    );

    let mut loaded = f.mapper.get(&f.person, john.key().unwrap()).unwrap();
    let managers = loaded.related(&f.mapper, "manager").unwrap();
    assert_eq!(managers.len(), 1);
    assert!(managers[0].same_record(&jane));
    assert_eq!(managers[0].get("first_name").unwrap(), &Value::from("jane"));

    assert!(loaded.related(&f.mapper, "friends").unwrap().is_empty());
}

#[test]
fn test_links_across_types() {
    let f = setup();
    let mut team = Object::with_fields(&f.team, [("name", "platform")]);
    team.save(&f.mapper).unwrap();

    let mut john = Object::with_fields(&f.person, [("first_name", "john")]);
    john.set_related("team", vec![team.clone()]);
    john.save(&f.mapper).unwrap();

    let mut loaded = f.mapper.get(&f.person, john.key().unwrap()).unwrap();
    let teams = loaded.related(&f.mapper, "team").unwrap();
    assert_eq!(teams[0].model().name(), "Team");
    assert_eq!(teams[0].get("name").unwrap(), &Value::from("platform"));
}

#[test]
fn test_backref_query_finds_exactly_the_referrers() {
    let f = setup();
    let jane = person(&f, "jane");
    let bob = person(&f, "bob");

    let mut reports = Vec::new();
    for name in ["john", "mary", "peter"] {
        let mut report = Object::with_fields(&f.person, [("first_name", name)]);
        report.set_related("manager", vec![jane.clone()]);
        report.save(&f.mapper).unwrap();
        reports.push(report);
    }
    let mut other = Object::with_fields(&f.person, [("first_name", "eve")]);
    other.set_related("manager", vec![bob.clone()]);
    other.save(&f.mapper).unwrap();

    let query = f
        .mapper
        .query(&f.person, Criteria::new().linked("manager", &jane))
        .unwrap();
    assert_eq!(query.kind(), QueryKind::Index);

    let found = query.all().unwrap();
    assert_eq!(found.len(), 3);
    for report in &reports {
        assert!(found.iter().any(|o| o.same_record(report)));
    }
    assert!(!found.iter().any(|o| o.same_record(&other)));
}

#[test]
fn test_changing_links_rewrites_index() {
    let f = setup();
    let jane = person(&f, "jane");
    let bob = person(&f, "bob");

    let mut john = Object::with_fields(&f.person, [("first_name", "john")]);
    john.set_related("manager", vec![jane.clone()]);
    john.save(&f.mapper).unwrap();

    john.set_related("manager", vec![bob.clone()]);
    john.save(&f.mapper).unwrap();

    let under_jane = f
        .mapper
        .query(&f.person, Criteria::new().linked("manager", &jane))
        .unwrap();
    assert!(under_jane.all().unwrap().is_empty());

    let under_bob = f
        .mapper
        .query(&f.person, Criteria::new().linked("manager", &bob))
        .unwrap();
    assert_eq!(under_bob.all().unwrap().len(), 1);

    john.unset("manager");
    john.save(&f.mapper).unwrap();
    assert!(john.links().is_empty());
    assert!(under_bob.all().unwrap().is_empty());
}

#[test]
fn test_untouched_link_fields_survive_a_save() {
    let f = setup();
    let jane = person(&f, "jane");

    let mut john = Object::with_fields(&f.person, [("first_name", "john")]);
    john.set_related("manager", vec![jane.clone()]);
    john.save(&f.mapper).unwrap();

    let mut loaded = f.mapper.get(&f.person, john.key().unwrap()).unwrap();
    loaded.set("first_name", "johnny");
    loaded.save(&f.mapper).unwrap();

    let mut again = f.mapper.get(&f.person, john.key().unwrap()).unwrap();
    assert!(again.related(&f.mapper, "manager").unwrap()[0].same_record(&jane));
    let query = f
        .mapper
        .query(&f.person, Criteria::new().linked("manager", &jane))
        .unwrap();
    assert_eq!(query.all().unwrap().len(), 1);
}

#[test]
fn test_unsaved_targets_are_rejected() {
    let f = setup();
    let jane = Object::with_fields(&f.person, [("first_name", "jane")]);

    let mut john = Object::with_fields(&f.person, [("first_name", "john")]);
    john.set_related("manager", vec![jane]);
    assert!(matches!(
        john.save(&f.mapper),
        Err(Error::Validation(ValidationError::UnsavedReference { .. }))
    ));
    assert!(f.backend.is_empty("users"));
}

#[test]
fn test_dangling_link() {
    let f = setup();
    let mut jane = person(&f, "jane");

    let mut john = Object::with_fields(&f.person, [("first_name", "john")]);
    john.set_related("manager", vec![jane.clone()]);
    john.save(&f.mapper).unwrap();
    jane.delete().unwrap();

    let mut loaded = f.mapper.get(&f.person, john.key().unwrap()).unwrap();
    assert!(matches!(
        loaded.related(&f.mapper, "manager"),
        Err(Error::NoSuchObject { .. })
    ));
}

#[test]
fn test_related_capability_checks() {
    let f = setup();
    let mut john = person(&f, "john");

    assert!(matches!(
        john.related(&f.mapper, "first_name"),
        Err(Error::NotALinkField { .. })
    ));
    assert!(matches!(
        john.related(&f.mapper, "shoe_size"),
        Err(Error::NoSuchField { .. })
    ));
    assert!(matches!(john.get("manager"), Err(Error::LinkField { .. })));

    let mut fresh = Object::new(&f.person);
    assert!(fresh.related(&f.mapper, "manager").unwrap().is_empty());
}

#[test]
fn test_json_view_renders_links() {
    let f = setup();
    let jane = person(&f, "jane");

    let mut john = Object::with_fields(&f.person, [("first_name", "john")]);
    john.set_related("manager", vec![jane.clone()]);
    john.save(&f.mapper).unwrap();

    let json = john.to_json();
    assert_eq!(json["first_name"], "john");
    assert_eq!(
        json["manager"],
        serde_json::json!([format!("users/{}", jane.key().unwrap())])
    );
}
