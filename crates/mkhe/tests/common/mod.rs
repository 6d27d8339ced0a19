#![allow(dead_code)]

use mkhe::mkrlwe::{
    Ciphertext, ConjugationKeySet, Decryptor, Encryptor, KeyGenerator, Parameters,
    ParametersBuilder, PartyId, PublicKey, RelinearizationKeySet, RotationKeySet, SecretKeySet,
};
use mkhe_math::rq::{Poly, Representation};
use mkhe_traits::FheEncrypter;
use num_traits::ToPrimitive;
use rand::thread_rng;
use std::error::Error;
use std::sync::Arc;

pub const DELTA: i64 = 1 << 30;

pub fn parameters(num_moduli: usize) -> Result<Arc<Parameters>, Box<dyn Error>> {
    Ok(ParametersBuilder::new()
        .set_degree(16)
        .set_moduli_sizes(&vec![50; num_moduli])
        .set_p_moduli_sizes(&[60, 60, 60])
        .set_rotations(&[1, 2, 3])
        .set_conjugation(true)
        .build_arc()?)
}

/// Parameters whose single P prime is smaller than Q and spans one digit.
pub fn small_p_parameters(num_moduli: usize) -> Result<Arc<Parameters>, Box<dyn Error>> {
    Ok(ParametersBuilder::new()
        .set_degree(16)
        .set_moduli_sizes(&vec![50; num_moduli])
        .set_p_moduli_sizes(&[60])
        .set_digit_size(1)
        .set_rotations(&[1, 2, 3])
        .set_conjugation(true)
        .build_arc()?)
}

/// The keys of a group of parties, each party holding every kind of key.
pub struct Parties {
    pub par: Arc<Parameters>,
    pub ids: Vec<PartyId>,
    pub public: Vec<PublicKey>,
    pub secrets: SecretKeySet,
    pub rlks: RelinearizationKeySet,
    pub rtks: RotationKeySet,
    pub cjks: ConjugationKeySet,
}

impl Parties {
    pub fn new(par: &Arc<Parameters>, count: u16) -> Result<Self, Box<dyn Error>> {
        let mut rng = thread_rng();
        let kg = KeyGenerator::new(par);
        let mut parties = Self {
            par: par.clone(),
            ids: vec![],
            public: vec![],
            secrets: SecretKeySet::new(par),
            rlks: RelinearizationKeySet::new(par),
            rtks: RotationKeySet::new(par),
            cjks: ConjugationKeySet::new(par),
        };
        for i in 0..count {
            let keys = kg.gen_party_keys(PartyId::new(i), &mut rng)?;
            parties.ids.push(PartyId::new(i));
            parties.public.push(keys.public);
            parties.secrets.insert(keys.secret)?;
            parties.rlks.insert(keys.relinearization)?;
            for rtk in keys.rotations {
                parties.rtks.insert(rtk)?;
            }
            if let Some(cjk) = keys.conjugation {
                parties.cjks.insert(cjk)?;
            }
        }
        Ok(parties)
    }

    /// Encrypts `values`, scaled by `DELTA`, under the key of party `index`.
    pub fn encrypt(&self, index: usize, values: &[i64]) -> Result<Ciphertext, Box<dyn Error>> {
        let pt = encode(&self.par, values)?;
        Ok(Encryptor::new(&self.public[index]).try_encrypt(&pt, &mut thread_rng())?)
    }

    /// Decrypts `ct` and rounds its coefficients to multiples of `scale`.
    pub fn decrypt(&self, ct: &Ciphertext, scale: i128) -> Result<Vec<i128>, Box<dyn Error>> {
        let m = Decryptor::new(&self.secrets).decrypt(ct)?;
        round(&m, scale)
    }
}

pub fn encode(par: &Arc<Parameters>, values: &[i64]) -> Result<Poly, Box<dyn Error>> {
    let scaled = values.iter().map(|v| v * DELTA).collect::<Vec<_>>();
    Ok(Poly::from_i64(
        &scaled,
        par.ctx_at_level(par.max_level())?,
        Representation::PowerBasis,
    )?)
}

pub fn round(m: &Poly, scale: i128) -> Result<Vec<i128>, Box<dyn Error>> {
    m.centered_coefficients()
        .iter()
        .map(|c| -> Result<i128, Box<dyn Error>> {
            let c = c.to_i128().ok_or("coefficient does not fit in an i128")?;
            Ok((c + scale / 2).div_euclid(scale))
        })
        .collect()
}
