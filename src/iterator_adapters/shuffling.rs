use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub trait Shuffling: Iterator {
    /// Buffer-shuffles the iterator with an injected generator, so a seeded
    /// run replays the same order.
    fn shuffling(self, max_elements_to_buffer: usize, rng: StdRng) -> Shuffler<Self>
    where
        Self: Sized,
    {
        Shuffler {
            iterator: self,
            max_elements_to_buffer,
            buffer: vec![],
            rng,
        }
    }
}

pub struct Shuffler<T: Iterator> {
    iterator: T,
    max_elements_to_buffer: usize,
    buffer: Vec<T::Item>,
    rng: StdRng,
}

impl<T: Iterator> Iterator for Shuffler<T> {
    type Item = T::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.fill_buffer_if_needed_and_shuffle();
        self.buffer.pop()
    }
}

impl<T: Iterator> Shuffler<T> {
    fn fill_buffer_if_needed_and_shuffle(&mut self) {
        let mut added_item = false;
        while self.buffer.len() < self.max_elements_to_buffer {
            match self.iterator.next() {
                None => break,
                Some(element) => {
                    self.buffer.push(element);
                    added_item = true;
                }
            }
        }
        if added_item {
            self.buffer.shuffle(&mut self.rng);
        }
    }
}

impl<T: ?Sized> Shuffling for T where T: Iterator {}
