//! Integration-Tests fuer das BenutzerRepository (In-Memory SQLite)

use klatsch_db::{BenutzerRepository, NeuerBenutzer, SqliteDb};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

#[tokio::test]
async fn benutzer_erstellen_und_laden() {
    let db = db().await;

    let benutzer = db
        .create(NeuerBenutzer {
            username: "alice",
            password_hash: "hash_alice",
        })
        .await
        .expect("Benutzer erstellen fehlgeschlagen");

    assert_eq!(benutzer.username, "alice");
    assert!(benutzer.last_login.is_none());

    let geladen = db
        .get_by_name("alice")
        .await
        .expect("get_by_name fehlgeschlagen")
        .expect("Benutzer sollte gefunden werden");

    assert_eq!(geladen.id, benutzer.id);
    assert_eq!(geladen.password_hash, "hash_alice");
}

#[tokio::test]
async fn unbekannter_benutzer_nicht_gefunden() {
    let db = db().await;
    assert!(db.get_by_name("niemand").await.unwrap().is_none());
    assert!(!db.exists("niemand").await.unwrap());
}

#[tokio::test]
async fn benutzername_unique() {
    let db = db().await;

    db.create(NeuerBenutzer {
        username: "charlie",
        password_hash: "hash1",
    })
    .await
    .unwrap();

    let fehler = db
        .create(NeuerBenutzer {
            username: "charlie",
            password_hash: "hash2",
        })
        .await
        .expect_err("Doppelter Benutzername muss fehlschlagen");
    assert!(fehler.ist_eindeutigkeit());

    // Der gespeicherte Hash bleibt der urspruengliche
    let geladen = db.get_by_name("charlie").await.unwrap().unwrap();
    assert_eq!(geladen.password_hash, "hash1");
}

#[tokio::test]
async fn exists_nach_erstellen() {
    let db = db().await;

    assert!(!db.exists("dora").await.unwrap());
    db.create(NeuerBenutzer {
        username: "dora",
        password_hash: "hash",
    })
    .await
    .unwrap();
    assert!(db.exists("dora").await.unwrap());
}

#[tokio::test]
async fn last_login_aktualisieren() {
    let db = db().await;

    let benutzer = db
        .create(NeuerBenutzer {
            username: "erik",
            password_hash: "hash",
        })
        .await
        .unwrap();

    db.update_last_login(benutzer.id).await.unwrap();

    let geladen = db.get_by_name("erik").await.unwrap().unwrap();
    assert!(geladen.last_login.is_some());
}
