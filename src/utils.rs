use crate::reference::Ref;

/// [Szudzik pairing function][szudzik-pairing].
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// Wrapping arithmetic: only the low bits feed the table index.
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing_szudzik(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

pub fn pairing2(a: u64, b: u64) -> u64 {
    pairing_szudzik(a, b)
}

pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Final avalanche step, so that structured keys spread over all buckets.
#[inline]
pub fn mix(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h
}

/// Hash used by the unique subtables and the computed tables.
pub trait MyHash {
    fn hash(&self) -> u64;
}

impl MyHash for u64 {
    fn hash(&self) -> u64 {
        mix(*self)
    }
}

impl MyHash for Ref {
    fn hash(&self) -> u64 {
        mix(self.raw() as u64)
    }
}

impl MyHash for (Ref, Ref) {
    fn hash(&self) -> u64 {
        mix(pairing2(self.0.raw() as u64, self.1.raw() as u64))
    }
}

impl MyHash for (Ref, Ref, Ref) {
    fn hash(&self) -> u64 {
        mix(pairing3(self.0.raw() as u64, self.1.raw() as u64, self.2.raw() as u64))
    }
}
