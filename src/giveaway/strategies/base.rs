use crate::giveaway::models::UserId;

pub struct DrawOptions<'a> {
    candidates: &'a [UserId],
    count: usize,
}

impl<'a> DrawOptions<'a> {
    pub fn new(candidates: &'a [UserId], count: usize) -> Self {
        DrawOptions { candidates, count }
    }

    // Returns everyone who may still win.
    pub fn candidates(&self) -> &'a [UserId] {
        self.candidates
    }

    // Returns how many winners were requested.
    pub fn count(&self) -> usize {
        self.count
    }

    // Returns how many winners can actually be drawn.
    pub fn effective_count(&self) -> usize {
        self.count.min(self.candidates.len())
    }
}

pub trait DrawStrategy: Send + Sync {
    // Returns `effective_count` distinct winners picked among the candidates.
    fn draw(&self, options: &DrawOptions) -> Vec<UserId>;
}
