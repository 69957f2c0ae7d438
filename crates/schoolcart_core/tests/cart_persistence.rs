use schoolcart_core::db::{open_db_in_memory, seed_catalog};
use schoolcart_core::{
    CartEntry, CartItem, CartReader, CartValidationError, CartWriter, CatalogSeed, EquipmentId,
    EquipmentItem, GradeId, RepoError, School, SqliteStore, UserId,
};

const ALICE: UserId = UserId::new(1);
const BOB: UserId = UserId::new(2);

fn seeded_store() -> SqliteStore {
    let mut conn = open_db_in_memory().unwrap();
    seed_catalog(&mut conn, &CatalogSeed::sample()).unwrap();
    SqliteStore::try_new(conn).unwrap()
}

fn entry(grade_id: i64, items: &[(i64, i64)]) -> CartEntry {
    let seed = CatalogSeed::sample();
    let grade = seed.grade(GradeId::new(grade_id)).unwrap().clone();
    let school = seed.school(grade.school_id).unwrap().clone();
    let items = items
        .iter()
        .map(|&(equipment_id, quantity)| {
            let equipment = seed
                .equipment_item(EquipmentId::new(equipment_id))
                .unwrap()
                .clone();
            CartItem::new(equipment, quantity)
        })
        .collect();
    CartEntry::new(school, grade, items)
}

fn canonical(cart: &[CartEntry]) -> Vec<CartEntry> {
    cart.iter().map(CartEntry::canonical).collect()
}

fn unit_rows(store: &SqliteStore, user_id: UserId, equipment_id: i64) -> i64 {
    store
        .connection()
        .query_row(
            "SELECT COUNT(*)
             FROM applied_unit au
             INNER JOIN cart_entry ce ON ce.id = au.cart_entry_id
             WHERE ce.user_id = ?1 AND au.equipment_id = ?2;",
            [user_id.get(), equipment_id],
            |row| row.get(0),
        )
        .unwrap()
}

fn entry_rows(store: &SqliteStore, user_id: UserId) -> i64 {
    store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM cart_entry WHERE user_id = ?1;",
            [user_id.get()],
            |row| row.get(0),
        )
        .unwrap()
}

#[test]
fn empty_store_returns_empty_cart() {
    let store = seeded_store();
    assert!(store.get_cart(ALICE).unwrap().is_empty());
}

#[test]
fn save_then_get_roundtrips_entries() {
    let mut store = seeded_store();
    let cart = vec![entry(1, &[(1, 4), (2, 2)]), entry(3, &[(5, 1), (2, 6)])];

    store.save_cart(ALICE, &cart).unwrap();
    let loaded = store.get_cart(ALICE).unwrap();

    assert_eq!(canonical(&loaded), canonical(&cart));
    assert!(loaded.iter().all(|entry| entry.id.is_some()));
    assert_eq!(loaded[1].school.name, "Riverside Middle School");
    assert_eq!(loaded[1].grade.name, "Grade 7");
}

#[test]
fn quantity_is_stored_as_repeated_unit_rows() {
    let mut store = seeded_store();
    store.save_cart(ALICE, &[entry(2, &[(3, 3)])]).unwrap();

    assert_eq!(unit_rows(&store, ALICE, 3), 3);
    let loaded = store.get_cart(ALICE).unwrap();
    assert_eq!(loaded[0].items.len(), 1);
    assert_eq!(loaded[0].items[0].equipment.id, EquipmentId::new(3));
    assert_eq!(loaded[0].items[0].quantity, 3);
}

#[test]
fn non_positive_quantities_write_no_rows() {
    let mut store = seeded_store();
    store
        .save_cart(ALICE, &[entry(1, &[(1, 0), (2, -3), (4, 1)])])
        .unwrap();

    assert_eq!(unit_rows(&store, ALICE, 1), 0);
    assert_eq!(unit_rows(&store, ALICE, 2), 0);
    let loaded = store.get_cart(ALICE).unwrap();
    assert_eq!(loaded[0].items.len(), 1);
    assert_eq!(loaded[0].items[0].equipment.id, EquipmentId::new(4));
}

#[test]
fn duplicate_lines_aggregate_to_summed_quantity() {
    let mut store = seeded_store();
    store
        .save_cart(ALICE, &[entry(1, &[(1, 2), (1, 3)])])
        .unwrap();

    let loaded = store.get_cart(ALICE).unwrap();
    assert_eq!(loaded[0].items.len(), 1);
    assert_eq!(loaded[0].items[0].quantity, 5);
}

#[test]
fn second_save_replaces_first_without_residue() {
    let mut store = seeded_store();
    let first = vec![entry(1, &[(1, 4)]), entry(2, &[(3, 1)])];
    let second = vec![entry(4, &[(6, 2)])];

    store.save_cart(ALICE, &first).unwrap();
    store.save_cart(ALICE, &second).unwrap();

    assert_eq!(canonical(&store.get_cart(ALICE).unwrap()), canonical(&second));
    assert_eq!(entry_rows(&store, ALICE), 1);
    assert_eq!(unit_rows(&store, ALICE, 1), 0);
    let orphan_units: i64 = store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM applied_unit
             WHERE cart_entry_id NOT IN (SELECT id FROM cart_entry);",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphan_units, 0);
}

#[test]
fn saving_empty_cart_clears_entries() {
    let mut store = seeded_store();
    store.save_cart(ALICE, &[entry(1, &[(1, 1)])]).unwrap();
    store.save_cart(ALICE, &[]).unwrap();

    assert!(store.get_cart(ALICE).unwrap().is_empty());
    assert_eq!(entry_rows(&store, ALICE), 0);
}

#[test]
fn entry_ids_are_reassigned_on_every_save() {
    let mut store = seeded_store();
    let cart = vec![entry(1, &[(1, 1)])];

    store.save_cart(ALICE, &cart).unwrap();
    let first_id = store.get_cart(ALICE).unwrap()[0].id;
    store.save_cart(ALICE, &cart).unwrap();
    let second_id = store.get_cart(ALICE).unwrap()[0].id;

    assert!(first_id.is_some());
    assert_ne!(first_id, second_id);
}

#[test]
fn school_is_rebuilt_from_the_grade_owner() {
    let mut store = seeded_store();
    let mut stale = entry(3, &[(5, 1)]);
    stale.school = School::new(1, "Some other school");

    store.save_cart(ALICE, &[stale]).unwrap();
    let loaded = store.get_cart(ALICE).unwrap();
    assert_eq!(loaded[0].school, School::new(2, "Riverside Middle School"));
}

#[test]
fn saves_for_one_user_never_touch_another() {
    let mut store = seeded_store();
    let bob_cart = vec![entry(3, &[(2, 6), (5, 1)])];
    store.save_cart(BOB, &bob_cart).unwrap();

    store.save_cart(ALICE, &[entry(1, &[(1, 4)])]).unwrap();
    store.save_cart(ALICE, &[]).unwrap();

    assert_eq!(canonical(&store.get_cart(BOB).unwrap()), canonical(&bob_cart));
}

#[test]
fn failure_during_unit_insert_keeps_previous_cart() {
    let mut store = seeded_store();
    let previous = vec![entry(1, &[(1, 4), (2, 2)])];
    store.save_cart(ALICE, &previous).unwrap();

    store
        .connection()
        .execute_batch(
            "CREATE TEMP TRIGGER fail_calculator_units
             BEFORE INSERT ON applied_unit
             WHEN NEW.equipment_id = 5
             BEGIN
                SELECT RAISE(ABORT, 'injected unit failure');
             END;",
        )
        .unwrap();

    let replacement = vec![entry(2, &[(1, 6)]), entry(3, &[(5, 1)])];
    let err = store.save_cart(ALICE, &replacement).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    assert_eq!(canonical(&store.get_cart(ALICE).unwrap()), canonical(&previous));
    assert_eq!(entry_rows(&store, ALICE), 1);
    assert_eq!(unit_rows(&store, ALICE, 1), 4);
}

#[test]
fn unknown_grade_rejects_whole_save() {
    let mut store = seeded_store();
    let previous = vec![entry(1, &[(1, 1)])];
    store.save_cart(ALICE, &previous).unwrap();

    let mut bogus = entry(2, &[(3, 1)]);
    bogus.grade.id = GradeId::new(404);
    let err = store
        .save_cart(ALICE, &[entry(4, &[(6, 1)]), bogus])
        .unwrap_err();

    assert!(matches!(err, RepoError::GradeNotFound(id) if id == GradeId::new(404)));
    assert_eq!(canonical(&store.get_cart(ALICE).unwrap()), canonical(&previous));
}

#[test]
fn unknown_equipment_rejects_whole_save() {
    let mut store = seeded_store();
    let mut cart = vec![entry(1, &[(1, 1)])];
    cart[0]
        .items
        .push(CartItem::new(EquipmentItem::new(77, "Mystery item"), 2));

    let err = store.save_cart(ALICE, &cart).unwrap_err();
    assert!(matches!(err, RepoError::EquipmentNotFound(id) if id == EquipmentId::new(77)));
    assert!(store.get_cart(ALICE).unwrap().is_empty());
}

#[test]
fn unknown_user_is_rejected_without_writing() {
    let mut store = seeded_store();
    let ghost = UserId::new(99);

    let err = store.save_cart(ghost, &[entry(1, &[(1, 1)])]).unwrap_err();
    assert!(matches!(err, RepoError::UserNotFound(id) if id == ghost));
    assert_eq!(entry_rows(&store, ghost), 0);
}

#[test]
fn large_quantities_roundtrip_without_a_configured_limit() {
    let mut store = seeded_store();
    let cart = vec![entry(1, &[(1, 1_001)]), entry(2, &[(1, 1_500)])];

    store.save_cart(ALICE, &cart).unwrap();

    assert_eq!(unit_rows(&store, ALICE, 1), 2_501);
    assert_eq!(canonical(&store.get_cart(ALICE).unwrap()), canonical(&cart));
}

#[test]
fn oversized_cart_is_rejected_before_any_write() {
    let mut store = seeded_store().with_max_units_per_save(Some(1_000));
    let previous = vec![entry(1, &[(1, 1)])];
    store.save_cart(ALICE, &previous).unwrap();

    let err = store
        .save_cart(ALICE, &[entry(1, &[(2, 5_000)])])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(CartValidationError::TooManyUnits {
            units: 5_000,
            max: 1_000
        })
    ));
    assert_eq!(canonical(&store.get_cart(ALICE).unwrap()), canonical(&previous));
}

#[test]
fn unit_limit_counts_duplicate_lines_across_entries() {
    let mut store = seeded_store().with_max_units_per_save(Some(1_000));

    let err = store
        .save_cart(ALICE, &[entry(1, &[(1, 1_000), (1, 1_000), (1, 1_000)])])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(CartValidationError::TooManyUnits { units: 3_000, .. })
    ));

    let err = store
        .save_cart(ALICE, &[entry(1, &[(1, 600)]), entry(2, &[(1, 600)])])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(CartValidationError::TooManyUnits { units: 1_200, .. })
    ));
    assert_eq!(unit_rows(&store, ALICE, 1), 0);

    store
        .save_cart(ALICE, &[entry(1, &[(1, 500), (1, 500)])])
        .unwrap();
    assert_eq!(unit_rows(&store, ALICE, 1), 1_000);
}

#[test]
fn connection_can_be_reclaimed_and_rewrapped() {
    let mut store = seeded_store();
    let cart = vec![entry(2, &[(3, 2)])];
    store.save_cart(ALICE, &cart).unwrap();

    let conn = store.into_inner();
    let reopened = SqliteStore::try_new(conn).unwrap();
    assert_eq!(canonical(&reopened.get_cart(ALICE).unwrap()), canonical(&cart));
}

#[test]
fn get_cart_fails_inside_caller_transaction() {
    let mut store = seeded_store();
    store.save_cart(ALICE, &[entry(1, &[(1, 1)])]).unwrap();

    store.connection().execute_batch("BEGIN;").unwrap();
    assert!(matches!(store.get_cart(ALICE), Err(RepoError::Db(_))));
    store.connection().execute_batch("ROLLBACK;").unwrap();

    assert_eq!(store.get_cart(ALICE).unwrap().len(), 1);
}
