use std::{cell::RefCell, rc::Rc};

use trellis::tutils::{attrs, TestCollection, TestSurface};
use trellis::*;

fn list_component(t: &mut Tree, coll: &TestCollection) -> (ComponentId, TestSurface) {
    let surface = TestSurface::new();
    let id = t.insert_list(
        ListSpec::new(coll.clone(), surface.clone())
            .component(ComponentSpec::new().identity("contacts")),
    );
    (id, surface)
}

fn item(id: i64, name: &str) -> Attributes {
    attrs(&[("id", Value::Int(id)), ("name", Value::from(name))])
}

#[test]
fn fetch_rebuilds_the_rows() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::new();
    let (id, surface) = list_component(&mut t, &coll);

    t.show(id, ShowOptions::new())?;
    coll.resolve_fetch(vec![item(1, "Ada"), item(2, "Grace")]);
    t.poll();

    assert!(t.is_visible(id));
    assert_eq!(surface.item_count(), 2);
    assert_eq!(t.list_items(id)?, vec![Value::Int(1), Value::Int(2)]);
    Ok(())
}

#[test]
fn incremental_changes_update_the_rows() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::auto(vec![item(1, "Ada")]);
    let (id, surface) = list_component(&mut t, &coll);
    t.show(id, ShowOptions::new())?;
    t.poll();

    coll.push_item(item(2, "Grace"));
    t.poll();
    assert_eq!(surface.item_count(), 2);
    assert_eq!(t.list_items(id)?, vec![Value::Int(1), Value::Int(2)]);

    coll.take_item(0);
    t.poll();
    assert_eq!(surface.item_count(), 1);
    assert_eq!(t.list_items(id)?, vec![Value::Int(2)]);
    assert_eq!(surface.items()[0].get("name"), Some(&Value::from("Grace")));
    Ok(())
}

#[test]
fn select_fires_item_selected_with_attributes_and_index() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::auto(vec![item(1, "Ada"), item(2, "Grace")]);
    let (id, _surface) = list_component(&mut t, &coll);
    t.show(id, ShowOptions::new())?;
    t.poll();

    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    t.on(id, events::ITEM_SELECTED, move |_, args| {
        l.borrow_mut().push((args[0].clone(), args[1].clone()));
    })?;

    t.select_item(id, 1)?;
    assert_eq!(t.selected_item(id)?, Some(Value::Int(2)));
    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].1, Value::Int(1));
    assert_eq!(
        log[0].0.as_map().and_then(|m| m.get("name")),
        Some(&Value::from("Grace"))
    );
    Ok(())
}

#[test]
fn selecting_out_of_range_is_tolerated() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::auto(vec![item(1, "Ada")]);
    let (id, _surface) = list_component(&mut t, &coll);
    t.show(id, ShowOptions::new())?;
    t.poll();

    t.select_item(id, 9)?;
    assert_eq!(t.selected_item(id)?, None);

    let mut strict = Tree::with_config(Config { strict: true });
    let coll = TestCollection::auto(vec![]);
    let (id, _surface) = list_component(&mut strict, &coll);
    strict.show(id, ShowOptions::new())?;
    strict.poll();
    assert!(matches!(
        strict.select_item(id, 0),
        Err(Error::Misconfigured(_))
    ));
    Ok(())
}

#[test]
fn removing_the_selected_item_clears_the_selection() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::auto(vec![item(1, "Ada"), item(2, "Grace")]);
    let (id, _surface) = list_component(&mut t, &coll);
    t.show(id, ShowOptions::new())?;
    t.poll();

    t.select_item(id, 0)?;
    assert_eq!(t.selected_item(id)?, Some(Value::Int(1)));
    coll.take_item(0);
    t.poll();
    assert_eq!(t.selected_item(id)?, None);
    Ok(())
}

#[test]
fn refetch_drops_a_selection_that_disappeared() -> Result<()> {
    let mut t = Tree::new();
    let coll = TestCollection::new();
    let (id, _surface) = list_component(&mut t, &coll);
    t.show(id, ShowOptions::new())?;
    coll.resolve_fetch(vec![item(1, "Ada"), item(2, "Grace")]);
    t.poll();

    t.select_item(id, 0)?;
    t.refresh_collection(id, None)?;
    coll.resolve_fetch(vec![item(2, "Grace")]);
    t.poll();
    assert_eq!(t.selected_item(id)?, None);
    assert_eq!(t.list_items(id)?, vec![Value::Int(2)]);
    Ok(())
}
