pub trait Batching: Iterator {
    /// Groups items into `Vec`s of `batch_size`. When `drop_last` is set the
    /// trailing partial batch is discarded instead of emitted.
    fn batches_of(self, batch_size: usize, drop_last: bool) -> Batcher<Self>
    where
        Self: Sized,
    {
        Batcher {
            iterator: self,
            batch_size,
            drop_last,
        }
    }
}

pub struct Batcher<T: Iterator> {
    iterator: T,
    batch_size: usize,
    drop_last: bool,
}

impl<T: Iterator> Iterator for Batcher<T> {
    type Item = Vec<T::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut output = Vec::with_capacity(self.batch_size);
        for _ in 0..self.batch_size {
            match self.iterator.next() {
                Some(item) => output.push(item),
                None => break,
            }
        }
        if output.is_empty() || (self.drop_last && output.len() < self.batch_size) {
            return None;
        }
        Some(output)
    }
}

impl<T: ?Sized> Batching for T where T: Iterator {}
