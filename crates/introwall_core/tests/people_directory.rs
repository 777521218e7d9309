use introwall_core::db::open_db_in_memory;
use introwall_core::storage::PEOPLE_KEY;
use introwall_core::{
    DatasetCheck, DatasetSource, LocalStorage, NewPerson, PeopleDirectory, PeopleError, Person,
    PersonValidationError,
};

fn person(id: &str, name: &str) -> Person {
    Person {
        id: id.to_string(),
        name: name.to_string(),
        city: None,
        mbti: None,
        zodiac: None,
        gender: None,
        tags: Vec::new(),
        headline: None,
        intro: None,
    }
}

fn ids<'a>(people: &[&'a Person]) -> Vec<&'a str> {
    people.iter().map(|person| person.id.as_str()).collect()
}

#[test]
fn fresh_storage_loads_bundled_seed() {
    let conn = open_db_in_memory().unwrap();
    let directory = PeopleDirectory::load(LocalStorage::new(&conn));

    assert_eq!(directory.source(), DatasetSource::Seed);
    assert_eq!(directory.dataset_check(), DatasetCheck::Ok);
    assert!(directory.get("p-001").is_some());
}

#[test]
fn search_matches_every_field_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let mut amy = person("1", "Amy Zhang");
    amy.city = Some("Berlin".to_string());
    amy.tags = vec!["Climbing".to_string()];
    let mut bo = person("2", "Bo");
    bo.mbti = Some("ENFP".to_string());
    bo.zodiac = Some("Leo".to_string());
    let mut cy = person("3", "Cy");
    cy.headline = Some("Sourdough evangelist".to_string());
    cy.intro = Some("I also climb on weekends.".to_string());

    let directory = PeopleDirectory::with_people(LocalStorage::new(&conn), vec![amy, bo, cy]);

    assert_eq!(ids(&directory.search("BERLIN")), vec!["1"]);
    assert_eq!(ids(&directory.search("enfp")), vec!["2"]);
    assert_eq!(ids(&directory.search("leo")), vec!["2"]);
    assert_eq!(ids(&directory.search("sourdough")), vec!["3"]);
    assert_eq!(ids(&directory.search("climb")), vec!["1", "3"]);
    assert!(directory.search("nobody").is_empty());
}

#[test]
fn blank_query_returns_everyone_in_order() {
    let conn = open_db_in_memory().unwrap();
    let directory = PeopleDirectory::with_people(
        LocalStorage::new(&conn),
        vec![person("b", "Bo"), person("a", "Amy")],
    );

    assert_eq!(ids(&directory.search("")), vec!["b", "a"]);
    assert_eq!(ids(&directory.search("   ")), vec!["b", "a"]);
}

#[test]
fn added_person_is_persisted_with_the_full_list() {
    let conn = open_db_in_memory().unwrap();
    let storage = LocalStorage::new(&conn);
    let mut directory = PeopleDirectory::load(storage);
    let seeded = directory.people().len();

    let mut input = NewPerson::named("  Dana  ");
    input.city = Some(" Oslo ".to_string());
    input.tags = vec!["ski".to_string(), " ".to_string(), "ski".to_string()];
    let added = directory.add_person(input).unwrap().clone();

    assert_eq!(added.name, "Dana");
    assert_eq!(added.city.as_deref(), Some("Oslo"));
    assert_eq!(added.tags, vec!["ski".to_string()]);
    assert_eq!(directory.source(), DatasetSource::LocalStorage);

    let reloaded = PeopleDirectory::load(storage);
    assert_eq!(reloaded.source(), DatasetSource::LocalStorage);
    assert_eq!(reloaded.people().len(), seeded + 1);
    assert_eq!(reloaded.people().last(), Some(&added));
    assert_eq!(ids(&reloaded.search("oslo")), vec![added.id.as_str()]);
}

#[test]
fn blank_name_is_rejected_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let storage = LocalStorage::new(&conn);
    let mut directory = PeopleDirectory::load(storage);
    let before = directory.people().len();

    let err = directory.add_person(NewPerson::named("   ")).unwrap_err();

    assert!(matches!(
        err,
        PeopleError::Validation(PersonValidationError::BlankName)
    ));
    assert_eq!(directory.people().len(), before);
    assert_eq!(storage.get_item(PEOPLE_KEY).unwrap(), None);
}

#[test]
fn corrupted_stored_list_falls_back_to_seed() {
    let conn = open_db_in_memory().unwrap();
    let storage = LocalStorage::new(&conn);
    storage.set_item(PEOPLE_KEY, "[{\"broken\":").unwrap();

    let directory = PeopleDirectory::load(storage);

    assert_eq!(directory.source(), DatasetSource::Seed);
    assert_eq!(directory.dataset_check(), DatasetCheck::Ok);
}

#[test]
fn dataset_check_flags_empty_or_idless_lists() {
    let conn = open_db_in_memory().unwrap();
    let storage = LocalStorage::new(&conn);

    assert_eq!(
        PeopleDirectory::with_people(storage, Vec::new()).dataset_check(),
        DatasetCheck::Empty
    );
    assert_eq!(
        PeopleDirectory::with_people(storage, vec![person(" ", "Amy")]).dataset_check(),
        DatasetCheck::Empty
    );
}
