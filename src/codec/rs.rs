//! Reed-Solomon coding over GF(2^8) with primitive polynomial `0x11d` and first consecutive root 1.
//!
//! Polynomials are coefficient vectors, highest degree first.

use std::sync::OnceLock;

struct Tables {
    exp: [u8; 512],
    log: [u8; 256],
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        for i in 0..255 {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= 0x11d;
            }
        }
        for i in 255..512 {
            exp[i] = exp[i - 255];
        }
        Tables { exp, log }
    })
}

fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = tables();
    t.exp[t.log[a as usize] as usize + t.log[b as usize] as usize]
}

fn div(a: u8, b: u8) -> Option<u8> {
    match (a, b) {
        (_, 0) => None,
        (0, _) => Some(0),
        _ => {
            let t = tables();
            Some(t.exp[(t.log[a as usize] as usize + 255 - t.log[b as usize] as usize) % 255])
        }
    }
}

fn pow(a: u8, power: usize) -> u8 {
    let t = tables();
    t.exp[(t.log[a as usize] as usize * power) % 255]
}

fn inverse(a: u8) -> Option<u8> {
    div(1, a)
}

fn scale(p: &[u8], x: u8) -> Vec<u8> {
    p.iter().map(|c| mul(*c, x)).collect()
}

fn add(p: &[u8], q: &[u8]) -> Vec<u8> {
    let len = p.len().max(q.len());
    let mut r = vec![0; len];
    for (i, c) in p.iter().enumerate() {
        r[i + len - p.len()] = *c;
    }
    for (i, c) in q.iter().enumerate() {
        r[i + len - q.len()] ^= *c;
    }
    r
}

fn poly_mul(p: &[u8], q: &[u8]) -> Vec<u8> {
    let mut r = vec![0; p.len() + q.len() - 1];
    for (j, b) in q.iter().enumerate() {
        for (i, a) in p.iter().enumerate() {
            r[i + j] ^= mul(*a, *b);
        }
    }
    r
}

fn eval(p: &[u8], x: u8) -> u8 {
    p.iter().skip(1).fold(p.first().copied().unwrap_or(0), |y, c| mul(y, x) ^ c)
}

fn generator(parity: usize) -> Vec<u8> {
    (0..parity).fold(vec![1], |g, i| poly_mul(&g, &[1, pow(2, i)]))
}

/// The `parity` check bytes for `message`.
pub(crate) fn encode(message: &[u8], parity: usize) -> Vec<u8> {
    let generator = generator(parity);
    let mut out = message.to_vec();
    out.resize(message.len() + parity, 0);
    for i in 0..message.len() {
        let coef = out[i];
        if coef != 0 {
            for (j, g) in generator.iter().enumerate().skip(1) {
                out[i + j] ^= mul(*g, coef);
            }
        }
    }
    out.split_off(message.len())
}

// leading zero keeps the indexing of the locator search aligned
fn syndromes(codeword: &[u8], parity: usize) -> Vec<u8> {
    std::iter::once(0).chain((0..parity).map(|i| eval(codeword, pow(2, i)))).collect()
}

/// Berlekamp-Massey.
fn error_locator(syndromes: &[u8], parity: usize) -> Option<Vec<u8>> {
    let mut locator = vec![1u8];
    let mut old = vec![1u8];
    let shift = syndromes.len() - parity;

    for i in 0..parity {
        let k = i + shift;
        let mut delta = syndromes[k];
        for j in 1..locator.len() {
            delta ^= mul(locator[locator.len() - 1 - j], syndromes[k - j]);
        }
        old.push(0);
        if delta != 0 {
            if old.len() > locator.len() {
                let next = scale(&old, delta);
                old = scale(&locator, inverse(delta)?);
                locator = next;
            }
            locator = add(&locator, &scale(&old, delta));
        }
    }

    let leading = locator.iter().take_while(|c| **c == 0).count();
    let locator = locator.split_off(leading);
    match (locator.len().saturating_sub(1)) * 2 <= parity {
        true => Some(locator),
        false => None,
    }
}

/// Chien search: positions whose locator root exists.
fn error_positions(locator: &[u8], len: usize) -> Option<Vec<usize>> {
    let reversed = locator.iter().rev().copied().collect::<Vec<_>>();
    let positions = (0..len).filter(|i| eval(&reversed, pow(2, *i)) == 0).map(|i| len - 1 - i).collect::<Vec<_>>();
    match positions.len() == locator.len() - 1 {
        true => Some(positions),
        false => None,
    }
}

/// Forney: apply the error magnitudes at `positions`.
fn correct_errata(codeword: &[u8], syndromes: &[u8], positions: &[usize]) -> Option<Vec<u8>> {
    let coef_positions = positions.iter().map(|p| codeword.len() - 1 - p).collect::<Vec<_>>();
    let locator = coef_positions.iter().fold(vec![1u8], |loc, i| poly_mul(&loc, &add(&[1], &[pow(2, *i), 0])));

    // evaluator = (syndromes * locator) mod x^(n+1), with n the locator degree
    let reversed_syndromes = syndromes.iter().rev().copied().collect::<Vec<_>>();
    let product = poly_mul(&reversed_syndromes, &locator);
    let keep = locator.len();
    let evaluator = product[product.len().saturating_sub(keep)..].to_vec();

    let x = coef_positions.iter().map(|p| pow(2, *p % 255)).collect::<Vec<_>>();
    let mut magnitudes = vec![0u8; codeword.len()];
    for (i, xi) in x.iter().enumerate() {
        let xi_inv = inverse(*xi)?;
        let derivative = x.iter().enumerate()
            .filter(|(j, _)| *j != i)
            .fold(1u8, |acc, (_, xj)| mul(acc, 1 ^ mul(xi_inv, *xj)));
        let y = mul(*xi, eval(&evaluator, xi_inv));
        magnitudes[positions[i]] = div(y, derivative)?;
    }

    Some(add(codeword, &magnitudes))
}

/// Repair `codeword` (message followed by `parity` check bytes), or [`None`] when the damage exceeds what the
/// parity can repair.
pub(crate) fn correct(codeword: &[u8], parity: usize) -> Option<Vec<u8>> {
    if codeword.len() > 255 || codeword.len() <= parity {
        return None;
    }
    let checks = syndromes(codeword, parity);
    if checks.iter().all(|s| *s == 0) {
        return Some(codeword.to_vec());
    }

    let locator = error_locator(&checks, parity)?;
    let positions = error_positions(&locator, codeword.len())?;
    let corrected = correct_errata(codeword, &checks, &positions)?;
    match syndromes(&corrected, parity).iter().all(|s| *s == 0) {
        true => Some(corrected),
        false => None,
    }
}
