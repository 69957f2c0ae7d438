use schoolcart_core::db::{open_db, seed_catalog};
use schoolcart_core::{
    CartEntry, CartItem, CartReader, CartWriter, CatalogSeed, EquipmentId, GradeId, SqliteStore,
    UserId,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const ALICE: UserId = UserId::new(1);
const BOB: UserId = UserId::new(2);
const ROUNDS: usize = 25;

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

fn open_store(path: &Path) -> SqliteStore {
    SqliteStore::try_new(open_db(path, Duration::from_secs(30)).unwrap()).unwrap()
}

fn seeded_file() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.db");
    let mut conn = open_db(&path, Duration::from_secs(30)).unwrap();
    seed_catalog(&mut conn, &CatalogSeed::sample()).unwrap();
    (dir, path)
}

#[test]
fn concurrent_saves_for_same_user_leave_one_complete_cart() {
    let (_dir, path) = seeded_file();
    let cart_a = vec![entry(1, &[(1, 4), (2, 2)]), entry(2, &[(3, 1)])];
    let cart_b = vec![entry(4, &[(2, 8), (5, 1), (6, 1)])];
    open_store(&path).save_cart(ALICE, &cart_a).unwrap();

    let writers: Vec<_> = [cart_a.clone(), cart_b.clone()]
        .into_iter()
        .map(|cart| {
            let path = path.clone();
            thread::spawn(move || {
                let mut store = open_store(&path);
                for _ in 0..ROUNDS {
                    store.save_cart(ALICE, &cart).unwrap();
                }
            })
        })
        .collect();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let path = path.clone();
        let done = Arc::clone(&done);
        let expected = [canonical(&cart_a), canonical(&cart_b)];
        thread::spawn(move || {
            let store = open_store(&path);
            let mut snapshots = 0;
            while !done.load(Ordering::SeqCst) {
                let seen = canonical(&store.get_cart(ALICE).unwrap());
                assert!(expected.contains(&seen), "mixed cart observed: {seen:?}");
                snapshots += 1;
            }
            snapshots
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::SeqCst);
    assert!(reader.join().unwrap() > 0);

    let store = open_store(&path);
    let final_cart = canonical(&store.get_cart(ALICE).unwrap());
    assert!(final_cart == canonical(&cart_a) || final_cart == canonical(&cart_b));

    let expected_units: usize = final_cart.iter().map(CartEntry::unit_count).sum();
    let stored_units: i64 = store
        .connection()
        .query_row(
            "SELECT COUNT(*)
             FROM applied_unit au
             INNER JOIN cart_entry ce ON ce.id = au.cart_entry_id
             WHERE ce.user_id = ?1;",
            [ALICE.get()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored_units, i64::try_from(expected_units).unwrap());
}

#[test]
fn concurrent_saves_for_different_users_do_not_interact() {
    let (_dir, path) = seeded_file();
    let alice_cart = vec![entry(1, &[(1, 2)])];
    let bob_cart = vec![entry(3, &[(2, 6), (5, 1)])];

    let handles: Vec<_> = [(ALICE, alice_cart.clone()), (BOB, bob_cart.clone())]
        .into_iter()
        .map(|(user_id, cart)| {
            let path = path.clone();
            thread::spawn(move || {
                let mut store = open_store(&path);
                for _ in 0..ROUNDS {
                    store.save_cart(user_id, &cart).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = open_store(&path);
    assert_eq!(canonical(&store.get_cart(ALICE).unwrap()), canonical(&alice_cart));
    assert_eq!(canonical(&store.get_cart(BOB).unwrap()), canonical(&bob_cart));
}
