#[cfg(test)]
mod basic;
#[cfg(test)]
mod burst;
#[cfg(test)]
mod random;

#[cfg(test)]
pub(crate) fn collect(mut it: hattrie::Iter<'_>) -> Vec<(Vec<u8>, u64)> {
    let mut out = Vec::new();
    while !it.finished() {
        let key = it.key().unwrap().to_vec();
        let val = *it.value().unwrap();
        out.push((key, val));
        it.next();
    }
    out
}
