use std::collections::HashSet;
use std::sync::mpsc;
use std::thread;

use seal_conformance::memory_pair;

#[test]
fn concurrent_seals_never_share_an_id() {
    let (alice, bob) = memory_pair().unwrap();
    let messages: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8u8)
            .map(|t| {
                let alice = &alice;
                scope.spawn(move || (0..100).map(|_| alice.seal(&[t; 24]).unwrap()).collect::<Vec<_>>())
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let ids: HashSet<u64> = messages.iter().map(|m| m.message_id).collect();
    assert_eq!(ids.len(), 800);
    assert_eq!(ids.iter().max().copied(), Some(800));

    let mut ordered = messages;
    ordered.sort_by_key(|m| m.message_id);
    for message in ordered {
        assert_eq!(bob.open(message).unwrap().len(), 24);
    }
}

#[test]
fn send_and_receive_run_on_separate_threads() {
    let (alice, bob) = memory_pair().unwrap();
    let (alice, bob) = (&alice, &bob);
    let (to_bob, bob_inbox) = mpsc::channel();
    let (to_alice, alice_inbox) = mpsc::channel();

    thread::scope(|scope| {
        scope.spawn(move || {
            for i in 0..50u32 {
                to_bob.send(alice.seal(&i.to_be_bytes()).unwrap()).unwrap();
            }
        });
        scope.spawn(move || {
            for i in 0..50u32 {
                to_alice.send(bob.seal(&i.to_be_bytes()).unwrap()).unwrap();
            }
        });
        scope.spawn(move || {
            for i in 0..50u32 {
                let plain = bob.open(bob_inbox.recv().unwrap()).unwrap();
                assert_eq!(&plain[..], &i.to_be_bytes()[..]);
            }
        });
        scope.spawn(move || {
            for i in 0..50u32 {
                let plain = alice.open(alice_inbox.recv().unwrap()).unwrap();
                assert_eq!(&plain[..], &i.to_be_bytes()[..]);
            }
        });
    });

    assert_eq!(alice.session().snapshot().unwrap(), bob.session().snapshot().unwrap());
}
