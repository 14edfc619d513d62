#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
	pub offset: u32,
	pub limit: u32,
}
impl Page {
	/// Fills in the default limit and clamps oversized requests to `max_limit`.
	pub fn resolve(
		offset: Option<u32>,
		limit: Option<u32>,
		default_limit: u32,
		max_limit: u32,
	) -> Self {
		Self { offset: offset.unwrap_or(0), limit: limit.unwrap_or(default_limit).min(max_limit) }
	}

	pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
		items.into_iter().skip(self.offset as usize).take(self.limit as usize).collect()
	}
}
