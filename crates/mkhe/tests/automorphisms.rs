mod common;

use common::{encode, parameters, round, Parties, DELTA};
use mkhe::mkrlwe::{Ciphertext, CrsSlot, Evaluator, KeyKind, PartyId, RotationKeySet};
use mkhe::Error;
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

const VALUES: [i64; 16] = [1, -2, 3, 0, 5, -6, 7, 8, -1, 2, 0, 4, -3, 6, 1, -5];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Encrypts `VALUES` as the sum of one share per party.
fn shared_ciphertext(parties: &Parties, ev: &Evaluator) -> Result<Ciphertext, Box<dyn StdError>> {
    let mut ct = parties.encrypt(0, &VALUES)?;
    for p in 1..parties.ids.len() {
        ct = ev.add_new(&ct, &parties.encrypt(p, &[0])?)?;
    }
    Ok(ct)
}

#[test]
fn rotation() -> Result<(), Box<dyn StdError>> {
    init_tracing();
    let par = parameters(3)?;
    let ev = Evaluator::new(&par);
    let parties = Parties::new(&par, 3)?;
    let ct = shared_ciphertext(&parties, &ev)?;
    let pt = encode(&par, &VALUES)?;

    // Amounts are taken modulo degree / 2, so 9 and 10 rotate by 1 and 2.
    for amount in [1usize, 2, 3, 9, 10] {
        let rotated = ev.rotate_new(&ct, amount, &parties.rtks)?;
        assert_eq!(rotated.identity_set(), ct.identity_set());
        let expected = pt.substitute(&par.rotation_exponent(amount)?)?;
        assert_eq!(
            parties.decrypt(&rotated, DELTA as i128)?,
            round(&expected, DELTA as i128)?
        );
    }

    // Rotations by multiples of degree / 2 are the identity and need no key.
    let empty = RotationKeySet::new(&par);
    assert_eq!(ev.rotate_new(&ct, 0, &empty)?, ct);
    assert_eq!(ev.rotate_new(&ct, 8, &empty)?, ct);

    assert_eq!(
        ev.rotate_new(&ct, 4, &parties.rtks).err(),
        Some(Error::MissingCrs(CrsSlot::Rotation(4)))
    );

    let mut partial = RotationKeySet::new(&par);
    for rtk in parties.rtks.iter().filter(|k| k.id() != PartyId::new(1)) {
        partial.insert(rtk.clone())?;
    }
    assert_eq!(
        ev.rotate_new(&ct, 1, &partial).err(),
        Some(Error::MissingKey {
            party: PartyId::new(1),
            kind: KeyKind::Rotation
        })
    );
    Ok(())
}

#[test]
fn rotation_composes() -> Result<(), Box<dyn StdError>> {
    let par = parameters(3)?;
    let ev = Evaluator::new(&par);
    let parties = Parties::new(&par, 2)?;
    let ct = shared_ciphertext(&parties, &ev)?;

    let twice = ev.rotate_new(&ev.rotate_new(&ct, 1, &parties.rtks)?, 2, &parties.rtks)?;
    let once = ev.rotate_new(&ct, 3, &parties.rtks)?;
    assert_eq!(
        parties.decrypt(&twice, DELTA as i128)?,
        parties.decrypt(&once, DELTA as i128)?
    );
    Ok(())
}

#[test]
fn hoisted_rotations_match() -> Result<(), Box<dyn StdError>> {
    init_tracing();
    let par = parameters(3)?;
    let ev = Evaluator::new(&par);
    let parties = Parties::new(&par, 3)?;
    let ct = shared_ciphertext(&parties, &ev)?;

    let h = ev.hoist(&ct)?;
    let many = ev.rotate_hoisted_many(&h, &[1, 2, 3], &parties.rtks)?;
    for (amount, rotated) in [1usize, 2, 3].into_iter().zip(many.iter()) {
        assert_eq!(rotated, &ev.rotate_new(&ct, amount, &parties.rtks)?);
        assert_eq!(rotated, &ev.rotate_hoisted_new(&h, amount, &parties.rtks)?);
    }
    assert_eq!(
        ev.conjugate_hoisted_new(&h, &parties.cjks)?,
        ev.conjugate_new(&ct, &parties.cjks)?
    );

    // A hoisted ciphertext can be rotated into a lower level.
    let mut low = Ciphertext::zero(&par, 1)?;
    ev.rotate_hoisted(&h, 2, &parties.rtks, &mut low)?;
    assert_eq!(low.level(), 1);
    let mut dropped = ct.clone();
    dropped.drop_to_level(1)?;
    assert_eq!(low, ev.rotate_new(&dropped, 2, &parties.rtks)?);
    Ok(())
}

#[test]
fn conjugation() -> Result<(), Box<dyn StdError>> {
    let par = parameters(2)?;
    let ev = Evaluator::new(&par);
    let parties = Parties::new(&par, 2)?;
    let ct = shared_ciphertext(&parties, &ev)?;
    let pt = encode(&par, &VALUES)?;

    let conjugated = ev.conjugate_new(&ct, &parties.cjks)?;
    let expected = pt.substitute(&par.conjugation_exponent()?)?;
    assert_eq!(
        parties.decrypt(&conjugated, DELTA as i128)?,
        round(&expected, DELTA as i128)?
    );

    let twice = ev.conjugate_new(&conjugated, &parties.cjks)?;
    assert_eq!(
        parties.decrypt(&twice, DELTA as i128)?,
        VALUES.iter().map(|v| *v as i128).collect::<Vec<_>>()
    );
    Ok(())
}
