use std::{cell::RefCell, rc::Rc};

use trellis::tutils::{attrs, TestCollection, TestSurface};
use trellis::*;

fn collection_component(
    t: &mut Tree,
    coll: &TestCollection,
    defaults: Params,
) -> (ComponentId, TestSurface) {
    let surface = TestSurface::new();
    let id = t.insert_collection(
        CollectionSpec::new(coll.clone())
            .default_params(defaults)
            .component(
                ComponentSpec::new()
                    .identity("feed")
                    .surface(surface.clone()),
            ),
    );
    (id, surface)
}

#[test]
fn fetch_merges_params_over_defaults() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::new();
    let defaults = attrs(&[("limit", Value::Int(10)), ("sort", Value::from("name"))]);
    let (id, _surface) = collection_component(&mut t, &coll, defaults);

    t.fetch_collection(id, Some(attrs(&[("limit", Value::Int(5))])), None)?;
    let params = coll.last_params().unwrap();
    assert_eq!(params.get("limit"), Some(&Value::Int(5)));
    assert_eq!(params.get("sort"), Some(&Value::from("name")));
    Ok(())
}

#[test]
fn fetch_without_params_resets_to_defaults() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::new();
    let defaults = attrs(&[("limit", Value::Int(10))]);
    let (id, _surface) = collection_component(&mut t, &coll, defaults);

    t.fetch_collection(id, Some(attrs(&[("limit", Value::Int(5))])), None)?;
    t.fetch_collection(id, None, None)?;
    assert_eq!(
        coll.last_params().unwrap().get("limit"),
        Some(&Value::Int(10))
    );
    assert_eq!(t.collection_params(id)?.get("limit"), Some(&Value::Int(10)));
    Ok(())
}

#[test]
fn refresh_reuses_the_current_params() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::new();
    let defaults = attrs(&[("limit", Value::Int(10))]);
    let (id, _surface) = collection_component(&mut t, &coll, defaults);

    t.fetch_collection(id, Some(attrs(&[("page", Value::Int(3))])), None)?;
    t.refresh_collection(id, None)?;
    let params = coll.last_params().unwrap();
    assert_eq!(params.get("page"), Some(&Value::Int(3)));
    assert_eq!(params.get("limit"), Some(&Value::Int(10)));
    assert_eq!(coll.fetch_count(), 2);
    Ok(())
}

#[test]
fn clear_params_drops_overrides() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::new();
    let defaults = attrs(&[("limit", Value::Int(10))]);
    let (id, _surface) = collection_component(&mut t, &coll, defaults);

    t.fetch_collection(id, Some(attrs(&[("page", Value::Int(3))])), None)?;
    t.clear_params(id)?;
    t.refresh_collection(id, None)?;
    let params = coll.last_params().unwrap();
    assert_eq!(params.get("page"), None);
    assert_eq!(params.get("limit"), Some(&Value::Int(10)));
    Ok(())
}

#[test]
fn show_gates_on_the_first_fetch() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::new();
    let (id, surface) = collection_component(&mut t, &coll, Params::new());
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    t.on(id, events::COLLECTION_LOADED, move |_, args| {
        l.borrow_mut().push(args[0].clone());
    })?;

    t.show(id, ShowOptions::new())?;
    assert!(!t.is_visible(id));
    assert_eq!(coll.fetch_count(), 1);

    coll.resolve_fetch(vec![attrs(&[("id", Value::Int(1))])]);
    t.poll();
    assert!(t.is_visible(id));
    assert!(surface.is_visible());
    assert_eq!(*log.borrow(), vec![Value::Int(1)]);

    // A second show skips the fetch now that the collection is loaded.
    t.hide(id, HideOptions::new())?;
    t.show(id, ShowOptions::new())?;
    assert!(t.is_visible(id));
    assert_eq!(coll.fetch_count(), 1);
    Ok(())
}

#[test]
fn show_with_params_always_fetches() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::auto(vec![attrs(&[("id", Value::Int(1))])]);
    let (id, _surface) = collection_component(&mut t, &coll, Params::new());

    t.show(id, ShowOptions::new())?;
    t.poll();
    t.show(id, ShowOptions::new().params(attrs(&[("page", Value::Int(2))])))?;
    t.poll();
    assert_eq!(coll.fetch_count(), 2);
    assert_eq!(
        coll.last_params().unwrap().get("page"),
        Some(&Value::Int(2))
    );
    Ok(())
}

#[test]
fn failed_fetch_leaves_the_component_unloaded_and_hidden() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::new();
    let (id, surface) = collection_component(&mut t, &coll, Params::new());

    t.show(id, ShowOptions::new())?;
    coll.fail_fetch("offline");
    t.poll();
    assert!(!t.is_visible(id));
    assert!(surface.calls().is_empty());

    // The next show fetches again because the collection never loaded.
    t.show(id, ShowOptions::new())?;
    assert_eq!(coll.fetch_count(), 2);
    Ok(())
}

#[test]
fn fetch_callback_runs_after_success() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::new();
    let (id, _surface) = collection_component(&mut t, &coll, Params::new());
    let hit = Rc::new(RefCell::new(false));
    let h = hit.clone();
    t.fetch_collection(
        id,
        None,
        Some(Box::new(move |_: &mut Tree, _| *h.borrow_mut() = true)),
    )?;
    coll.resolve_fetch(Vec::new());
    t.poll();
    assert!(*hit.borrow());
    Ok(())
}

#[test]
fn collection_changes_rerender_a_visible_component() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::auto(vec![attrs(&[("id", Value::Int(1))])]);
    let (id, surface) = collection_component(&mut t, &coll, Params::new());

    t.show(id, ShowOptions::new())?;
    t.poll();
    let renders = surface
        .calls()
        .iter()
        .filter(|c| *c == "render")
        .count();

    coll.push_item(attrs(&[("id", Value::Int(2))]));
    t.poll();
    let after = surface
        .calls()
        .iter()
        .filter(|c| *c == "render")
        .count();
    assert_eq!(after, renders + 1);
    assert_eq!(t.collection_len(id)?, 2);
    Ok(())
}
