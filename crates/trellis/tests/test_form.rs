use std::{cell::RefCell, rc::Rc};

use trellis::tutils::{attrs, TestSource, TestSurface};
use trellis::*;

fn form_component(t: &mut Tree, source: &TestSource) -> (ComponentId, TestSurface) {
    let surface = TestSurface::new();
    let id = t.insert_form(
        FormSpec::new(source.clone(), surface.clone())
            .component(ComponentSpec::new().identity("contact_form")),
    );
    (id, surface)
}

#[test]
fn a_form_starts_with_a_blank_entity() -> Result<()> {
    let mut t = Tree::new();
    let source = TestSource::new();
    let (id, _surface) = form_component(&mut t, &source);
    assert_eq!(source.created().len(), 1);
    assert_eq!(t.model_attributes(id)?, attrs(&[]));
    Ok(())
}

#[test]
fn submit_saves_the_field_values() -> Result<()> {
    let mut t = Tree::new();
    let source = TestSource::new();
    let (id, surface) = form_component(&mut t, &source);
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    t.on(id, events::SAVED, move |_, args| {
        l.borrow_mut().push(args[0].clone());
    })?;

    surface.set_field("name", "Ada");
    surface.set_field("email", "ada@example.com");
    t.submit_form(id, None)?;

    let entity = source.last_created().unwrap();
    assert_eq!(entity.save_count(), 1);
    assert_eq!(
        entity.attributes().get("name"),
        Some(&Value::from("Ada"))
    );

    entity.resolve_save(attrs(&[("id", Value::Int(42))]));
    t.poll();
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(t.model_attributes(id)?.get("id"), Some(&Value::Int(42)));
    Ok(())
}

#[test]
fn failed_submit_fires_save_failed() -> Result<()> {
    let mut t = Tree::new();
    let source = TestSource::new();
    let (id, surface) = form_component(&mut t, &source);
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    t.on(id, events::SAVE_FAILED, move |_, args| {
        l.borrow_mut().push((args[0].clone(), args[1].clone()));
    })?;

    surface.set_field("name", "Ada");
    t.submit_form(id, None)?;
    source.last_created().unwrap().fail_save("validation");
    t.poll();

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log[0].0.as_map().and_then(|m| m.get("name")),
        Some(&Value::from("Ada"))
    );
    assert_eq!(log[0].1, Value::from("validation"));
    Ok(())
}

#[test]
fn clear_starts_over_with_a_fresh_entity() -> Result<()> {
    let mut t = Tree::new();
    let source = TestSource::new();
    let (id, surface) = form_component(&mut t, &source);

    surface.set_field("name", "Ada");
    t.submit_form(id, None)?;
    source.last_created().unwrap().resolve_save(attrs(&[]));
    t.poll();

    t.clear_form(id)?;
    assert_eq!(source.created().len(), 2);
    assert_eq!(t.model_attributes(id)?, attrs(&[]));
    Ok(())
}

#[test]
fn editing_an_existing_record_renders_its_attributes() -> Result<()> {
    let mut t = Tree::new();
    let source = TestSource::new();
    let (id, surface) = form_component(&mut t, &source);

    t.show(id, ShowOptions::new().record(7i64))?;
    source.last_created().unwrap().resolve_fetch(attrs(&[("name", Value::from("Ada"))]));
    t.poll();
    assert!(t.is_visible(id));
    assert_eq!(surface.data().get("name"), Some(&Value::from("Ada")));
    Ok(())
}
