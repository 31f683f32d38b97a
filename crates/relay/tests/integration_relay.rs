//! End-to-End-Tests fuer den Relay-Kern
//!
//! Startet einen echten `RelayServer` auf Port 0 (In-Memory SQLite als
//! Credential-Store und Chat-Log) und spricht das Leitungsprotokoll
//! ueber echte TCP-Verbindungen.

use klatsch_auth::AuthService;
use klatsch_db::{ChatLogRepository, SqliteDb};
use klatsch_protocol::{read_frame, write_frame, ChatMessage, DEFAULT_MAX_FRAME_SIZE};
use klatsch_relay::{RelayConfig, RelayServer, RelayState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::watch;

async fn test_state() -> Arc<RelayState<SqliteDb>> {
    let db = Arc::new(
        SqliteDb::in_memory()
            .await
            .expect("In-Memory DB konnte nicht erstellt werden"),
    );
    let auth_service = Arc::new(AuthService::neu(Arc::clone(&db)));
    RelayState::neu(RelayConfig::default(), auth_service, Arc::clone(&db))
}

async fn test_server(
    state: Arc<RelayState<SqliteDb>>,
) -> (RelayServer<SqliteDb>, SocketAddr, watch::Sender<bool>, watch::Receiver<bool>) {
    let server = RelayServer::binden(state, "127.0.0.1:0".parse().unwrap())
        .await
        .expect("Bind fehlgeschlagen");
    let adresse = server.lokale_adresse().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    (server, adresse, shutdown_tx, shutdown_rx)
}

async fn naechste_nachricht(stream: &mut TcpStream) -> ChatMessage {
    tokio::time::timeout(Duration::from_secs(10), read_frame(stream, DEFAULT_MAX_FRAME_SIZE))
        .await
        .expect("Zeitueberschreitung beim Warten auf Frame")
        .expect("Frame-Lesen fehlgeschlagen")
}

async fn keine_nachricht(stream: &mut TcpStream) {
    let ergebnis = tokio::time::timeout(
        Duration::from_millis(300),
        read_frame(stream, DEFAULT_MAX_FRAME_SIZE),
    )
    .await;
    assert!(ergebnis.is_err(), "Unerwartete Nachricht empfangen");
}

/// Registriert einen Benutzer und konsumiert Bestaetigung + eigene
/// Join-Benachrichtigung
async fn registrieren(stream: &mut TcpStream, username: &str, passwort: &str) {
    write_frame(
        stream,
        &ChatMessage::system(format!("REGISTER {username} {passwort}")),
    )
    .await
    .unwrap();

    let bestaetigung = naechste_nachricht(stream).await;
    assert_eq!(bestaetigung, ChatMessage::system("Registration successful"));

    let beitritt = naechste_nachricht(stream).await;
    assert_eq!(
        beitritt,
        ChatMessage::server(format!("{username} has joined the chat!"))
    );
}

#[tokio::test]
async fn registrierung_mit_join_benachrichtigung() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "geheim").await;

        assert_eq!(state.registry.anzahl(), 1);
        // Die Join-Benachrichtigung ist der einzige Log-Eintrag
        assert_eq!(state.db.count().await.unwrap(), 1);

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn doppelte_registrierung_schlaegt_fehl() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "geheim").await;

        // Zweite Registrierung desselben Namens von einer anderen Verbindung
        let mut eindringling = TcpStream::connect(adresse).await.unwrap();
        write_frame(
            &mut eindringling,
            &ChatMessage::system("REGISTER alice anderes"),
        )
        .await
        .unwrap();
        let antwort = naechste_nachricht(&mut eindringling).await;
        assert_eq!(antwort, ChatMessage::system("Registration failed"));
        assert_eq!(state.registry.anzahl(), 1);

        // Das urspruengliche Passwort gilt weiterhin
        write_frame(&mut eindringling, &ChatMessage::system("LOGIN alice geheim"))
            .await
            .unwrap();
        let antwort = naechste_nachricht(&mut eindringling).await;
        assert_eq!(antwort, ChatMessage::system("Login successful"));

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn fehlgeschlagener_login_laesst_session_unauthentifiziert() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "geheim").await;
        write_frame(&mut alice, &ChatMessage::system("DISCONNECT"))
            .await
            .unwrap();
        // EOF bestaetigt, dass der Close-Pfad durchgelaufen ist
        assert!(read_frame(&mut alice, DEFAULT_MAX_FRAME_SIZE).await.is_err());

        let mut spaeter = TcpStream::connect(adresse).await.unwrap();
        write_frame(&mut spaeter, &ChatMessage::system("LOGIN alice falsch"))
            .await
            .unwrap();
        let antwort = naechste_nachricht(&mut spaeter).await;
        assert_eq!(antwort, ChatMessage::system("Login failed"));
        assert_eq!(state.registry.anzahl(), 0, "Session bleibt draussen");

        // Die Verbindung bleibt offen; korrekter Login funktioniert danach
        write_frame(&mut spaeter, &ChatMessage::system("LOGIN alice geheim"))
            .await
            .unwrap();
        let antwort = naechste_nachricht(&mut spaeter).await;
        assert_eq!(antwort, ChatMessage::system("Login successful"));
        assert_eq!(state.registry.anzahl(), 1);

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn chat_rundruf_erreicht_alle_in_sendereihenfolge() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "pw").await;

        let mut bob = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut bob, "bob", "pw").await;

        // Alice sieht Bobs Beitritt
        let beitritt = naechste_nachricht(&mut alice).await;
        assert_eq!(beitritt, ChatMessage::server("bob has joined the chat!"));

        // Drei Nachrichten in Folge; beide empfangen sie in Sendereihenfolge
        for i in 1..=3 {
            write_frame(&mut alice, &ChatMessage::neu("alice", format!("nachricht {i}")))
                .await
                .unwrap();
        }
        for i in 1..=3 {
            let bei_bob = naechste_nachricht(&mut bob).await;
            assert_eq!(bei_bob, ChatMessage::neu("alice", format!("nachricht {i}")));
            // Der Absender selbst ist ebenfalls Empfaenger des Rundrufs
            let bei_alice = naechste_nachricht(&mut alice).await;
            assert_eq!(bei_alice, ChatMessage::neu("alice", format!("nachricht {i}")));
        }

        // Genau ein Log-Eintrag pro Rundruf: 2 Joins + 3 Chat-Nachrichten
        assert_eq!(state.db.count().await.unwrap(), 5);
        let eintraege = state.db.list_recent(10).await.unwrap();
        assert!(eintraege
            .iter()
            .any(|e| e.sender == "alice" && e.content == "nachricht 2"));

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn gefaelschter_absender_wird_verworfen() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "pw").await;
        let mut bob = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut bob, "bob", "pw").await;
        let _ = naechste_nachricht(&mut alice).await; // Bobs Beitritt

        let log_vorher = state.db.count().await.unwrap();

        // Alice behauptet, Bob zu sein: kein Rundruf, kein Log-Eintrag
        write_frame(&mut alice, &ChatMessage::neu("bob", "ich bin bob"))
            .await
            .unwrap();
        keine_nachricht(&mut bob).await;
        assert_eq!(state.db.count().await.unwrap(), log_vorher);

        // Die Session ist weiterhin funktionsfaehig
        write_frame(&mut alice, &ChatMessage::neu("alice", "ehrlich"))
            .await
            .unwrap();
        assert_eq!(
            naechste_nachricht(&mut bob).await,
            ChatMessage::neu("alice", "ehrlich")
        );

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn leerraum_inhalt_wird_verworfen() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "pw").await;
        let mut bob = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut bob, "bob", "pw").await;
        let _ = naechste_nachricht(&mut alice).await; // Bobs Beitritt

        let log_vorher = state.db.count().await.unwrap();

        write_frame(&mut alice, &ChatMessage::neu("alice", "   "))
            .await
            .unwrap();
        keine_nachricht(&mut bob).await;
        assert_eq!(state.db.count().await.unwrap(), log_vorher);

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn disconnect_sendet_abschied_an_verbleibende() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "pw").await;
        let mut bob = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut bob, "bob", "pw").await;
        let _ = naechste_nachricht(&mut alice).await; // Bobs Beitritt

        write_frame(&mut alice, &ChatMessage::system("DISCONNECT"))
            .await
            .unwrap();

        let abschied = naechste_nachricht(&mut bob).await;
        assert_eq!(abschied, ChatMessage::server("alice has left the chat!"));
        // Entfernung passiert vor der Abschieds-Zustellung
        assert_eq!(state.registry.anzahl(), 1);

        // Die getrennte Verbindung liefert nur noch EOF
        let rest = read_frame(&mut alice, DEFAULT_MAX_FRAME_SIZE).await;
        assert!(rest.is_err(), "Alice darf ihren eigenen Abschied nicht sehen");

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn unauthentifizierte_trennung_ohne_abschied() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "pw").await;

        // Verbindet sich, authentifiziert sich nie, trennt
        let mut fluechtig = TcpStream::connect(adresse).await.unwrap();
        write_frame(&mut fluechtig, &ChatMessage::system("DISCONNECT"))
            .await
            .unwrap();

        keine_nachricht(&mut alice).await;
        assert_eq!(state.registry.anzahl(), 1);

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn unvollstaendiges_kommando_ist_noop() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut verbindung = TcpStream::connect(adresse).await.unwrap();

        // LOGIN ohne Passwort: weder Bestaetigung noch Ablehnung
        write_frame(&mut verbindung, &ChatMessage::system("LOGIN alice"))
            .await
            .unwrap();
        keine_nachricht(&mut verbindung).await;

        // Die Verbindung ist danach weiterhin benutzbar
        registrieren(&mut verbindung, "alice", "pw").await;

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn login_auf_authentifizierter_session_schlaegt_fehl() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "pw").await;

        write_frame(&mut alice, &ChatMessage::system("LOGIN alice pw"))
            .await
            .unwrap();
        let antwort = naechste_nachricht(&mut alice).await;
        assert_eq!(antwort, ChatMessage::system("Login failed"));
        assert_eq!(state.registry.anzahl(), 1, "Mitgliedschaft unveraendert");

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}

#[tokio::test]
async fn kaputter_frame_trennt_nur_diese_session() {
    let state = test_state().await;
    let (server, adresse, shutdown_tx, shutdown_rx) = test_server(Arc::clone(&state)).await;

    let klient = async {
        let mut alice = TcpStream::connect(adresse).await.unwrap();
        registrieren(&mut alice, "alice", "pw").await;

        // Laengen-Feld weit ueber dem Frame-Limit: Protokollfehler
        let mut kaputt = TcpStream::connect(adresse).await.unwrap();
        kaputt
            .write_all(&(10_000_000u32).to_be_bytes())
            .await
            .unwrap();
        kaputt.flush().await.unwrap();

        let antwort = read_frame(&mut kaputt, DEFAULT_MAX_FRAME_SIZE).await;
        assert!(antwort.is_err(), "Kaputte Session wird getrennt");

        // Alice chattet ungestoert weiter (Rundruf erreicht sie selbst)
        write_frame(&mut alice, &ChatMessage::neu("alice", "noch da"))
            .await
            .unwrap();
        assert_eq!(
            naechste_nachricht(&mut alice).await,
            ChatMessage::neu("alice", "noch da")
        );

        shutdown_tx.send(true).unwrap();
    };

    let (server_ergebnis, ()) = tokio::join!(server.starten(shutdown_rx), klient);
    server_ergebnis.unwrap();
}
