//! Deletion and session disposal.

mod common;

use common::*;
use docgraph_client::{Method, StatusCode};
use docgraph_orm::prelude::*;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn delete_evicts_and_a_later_get_goes_remote() -> anyhow::Result<()> {
    let (backend, session) = setup();
    backend.insert(person_resource("p1", "Ada"));
    let ada = session.get::<Person>(&id("p1")).await?.expect("exists");
    ada.set_name("Grace")?;

    session.delete(&*ada).await?;

    let request = backend.last_request().expect("delete sent");
    assert_eq!(request.method, Method::DELETE);
    assert_eq!(request.path, "person/p1");
    assert!(!session.identity_map().contains(&id("p1")));
    assert!(session.patches().is_empty());
    assert!(ada.state().is_deleted());

    assert!(session.get::<Person>(&id("p1")).await?.is_none());
    assert_eq!(backend.count(&Method::GET), 2);
    Ok(())
}

#[tokio::test]
async fn deleted_model_rejects_writes() -> anyhow::Result<()> {
    let (backend, session) = setup();
    backend.insert(person_resource("p1", "Ada"));
    let ada = session.get::<Person>(&id("p1")).await?.expect("exists");
    session.delete(&*ada).await?;

    assert!(matches!(ada.set_name("Grace"), Err(OrmError::ModelDeleted { .. })));
    assert!(matches!(ada.set_employer(None), Err(OrmError::ModelDeleted { .. })));
    assert!(matches!(
        session.update(&*ada).await,
        Err(OrmError::ModelDeleted { .. })
    ));
    assert!(matches!(
        session.delete(&*ada).await,
        Err(OrmError::ModelDeleted { .. })
    ));
    // Reads fall back to the (empty) backing fields.
    assert_eq!(ada.name()?, None);
    Ok(())
}

#[tokio::test]
async fn delete_by_id_marks_the_cached_instance() -> anyhow::Result<()> {
    let (backend, session) = setup();
    backend.insert(pet_resource("rex", "Rex"));
    let rex = session.get::<Pet>(&id("rex")).await?.expect("exists");

    session.delete_by_id::<Pet>(&id("rex")).await?;

    assert!(rex.state().is_deleted());
    assert!(!backend.contains(&id("rex")));
    assert!(session.identity_map().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_delete_keeps_the_instance_managed() -> anyhow::Result<()> {
    let (backend, session) = setup();
    backend.insert(person_resource("p1", "Ada"));
    let ada = session.get::<Person>(&id("p1")).await?.expect("exists");

    backend.fail_next(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(session.delete(&*ada).await.is_err());
    assert!(session.is_managed(&*ada));
    assert!(session.identity_map().contains(&id("p1")));

    let err = session.delete_by_id::<Person>(&id("nobody")).await.unwrap_err();
    assert!(matches!(
        err,
        OrmError::RemoteRequestFailed { status, .. } if status == StatusCode::NOT_FOUND
    ));
    Ok(())
}

#[tokio::test]
async fn delete_requires_an_id() -> anyhow::Result<()> {
    let (backend, session) = setup();
    let err = session.delete(&*Person::named("Ada")).await.unwrap_err();
    assert!(matches!(err, OrmError::MissingId(_)));
    assert_eq!(backend.request_count(), 0);
    Ok(())
}

#[tokio::test]
async fn disposed_session_rejects_every_operation() -> anyhow::Result<()> {
    let (backend, session) = setup();
    backend.insert(person_resource("p1", "Ada"));
    let ada = session.get::<Person>(&id("p1")).await?.expect("exists");
    backend.clear_requests();

    session.dispose();
    session.dispose();
    assert!(session.is_disposed());
    assert!(session.identity_map().is_empty());

    assert!(matches!(
        session.get::<Person>(&id("p1")).await,
        Err(OrmError::SessionDisposed)
    ));
    assert!(matches!(
        session.create(&*Person::named("Grace")).await,
        Err(OrmError::SessionDisposed)
    ));
    assert!(matches!(session.update(&*ada).await, Err(OrmError::SessionDisposed)));
    assert!(matches!(session.delete(&*ada).await, Err(OrmError::SessionDisposed)));
    assert!(matches!(ada.name(), Err(OrmError::SessionDisposed)));
    assert!(matches!(ada.set_name("Grace"), Err(OrmError::SessionDisposed)));
    assert!(matches!(ada.employer().await, Err(OrmError::SessionDisposed)));
    assert_eq!(backend.request_count(), 0);
    Ok(())
}

#[tokio::test]
async fn dropped_session_is_treated_as_disposed() -> anyhow::Result<()> {
    let (backend, session) = setup();
    backend.insert(person_resource("p1", "Ada"));
    let ada = session.get::<Person>(&id("p1")).await?.expect("exists");

    drop(session);

    assert!(matches!(ada.name(), Err(OrmError::SessionDisposed)));
    Ok(())
}
