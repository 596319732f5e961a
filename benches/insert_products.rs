//! This bench test simulates loading a building model: a deep chain of local
//! placements with many products placed along it, followed by a snapshot round
//! trip and a cascading delete.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use ifc_kernel::{
    Config, MemoryStore, Organization, Person, PersonAndOrganization, Universe,
    domain::{
        Identifier, Label, ObjectPlacement, PlacementId, ProductDraft, RootDraft, Specialization,
    },
};

const STOREYS: usize = 50;
const PRODUCTS_PER_STOREY: usize = 40;

/// Builds a tower of placements and places products on every storey.
fn preseed_universe() -> Universe {
    let mut universe = Universe::new(Config::default());
    let mut parent: Option<PlacementId> = None;
    for storey in 0..STOREYS {
        let placement = universe
            .insert(ObjectPlacement::local(
                Identifier::new(format!("L{storey:03}")).unwrap(),
                parent,
            ))
            .unwrap()
            .0;
        for product in 0..PRODUCTS_PER_STOREY {
            universe
                .create_entity(
                    RootDraft::new().with_name(format!("P{storey:03}-{product:03}")),
                    Specialization::Product(ProductDraft {
                        object_placement: Some(placement),
                        representation: None,
                    }),
                )
                .unwrap();
        }
        parent = Some(placement);
    }
    universe
}

fn insert_products(c: &mut Criterion) {
    c.bench_function("insert products", |b| b.iter(preseed_universe));
}

fn snapshot_round_trip(c: &mut Criterion) {
    let universe = preseed_universe();
    c.bench_function("snapshot round trip", |b| {
        b.iter(|| {
            let mut store = MemoryStore::new();
            universe.save(&mut store).unwrap();
            Universe::load(&store, Config::default()).unwrap()
        });
    });
}

fn cascade_delete(c: &mut Criterion) {
    c.bench_function("cascade delete", |b| {
        b.iter_batched(
            || {
                // Setup: one organization with many staff pairings
                let mut universe = Universe::new(Config::default());
                let organization = universe
                    .insert(Organization::named(Label::new("Acme").unwrap()))
                    .unwrap()
                    .0;
                for _ in 0..500 {
                    let person = universe.insert(Person::default()).unwrap().0;
                    universe
                        .insert(PersonAndOrganization::new(person, organization))
                        .unwrap();
                }
                (universe, organization)
            },
            |(mut universe, organization)| universe.delete(organization).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, insert_products, snapshot_round_trip, cascade_delete);
criterion_main!(benches);
