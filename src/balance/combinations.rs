//! Lexicographic k-combinations over `0..n`.

/// Iterator over every `k`-element index subset of `0..n`, in
/// lexicographic order. Yields `C(n, k)` items.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        let current = (k <= n).then(|| (0..k).collect());
        Self { n, current }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.current.take()?;
        let k = out.len();

        // Advance: find the rightmost slot that can still move right.
        let mut next = out.clone();
        let mut i = k;
        while i > 0 {
            i -= 1;
            if next[i] < self.n - k + i {
                next[i] += 1;
                for j in i + 1..k {
                    next[j] = next[j - 1] + 1;
                }
                self.current = Some(next);
                break;
            }
        }
        Some(out)
    }
}

/// Indices of `0..n` not present in the sorted `chosen`.
pub fn complement(n: usize, chosen: &[usize]) -> Vec<usize> {
    let mut rest = Vec::with_capacity(n.saturating_sub(chosen.len()));
    let mut it = chosen.iter().peekable();
    for i in 0..n {
        if it.peek() == Some(&&i) {
            it.next();
        } else {
            rest.push(i);
        }
    }
    rest
}
