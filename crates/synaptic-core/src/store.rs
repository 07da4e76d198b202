//! Vector Store
//!
//! Append-only, resizable row storage for fixed-dimension vectors with a
//! name ↔ index mapping. The store knows nothing about concepts; it only
//! keeps rows dense and answers cosine-similarity queries.
//!
//! Rows live in a single `capacity × dim` matrix. When the matrix is full its
//! capacity doubles and live rows are copied over unchanged. Removal is O(1):
//! the last live row is swapped into the freed slot.

use std::collections::HashMap;

use ndarray::{s, Array2, ArrayView1};

use crate::error::{CoreError, Result};

/// Norms below this are treated as zero.
pub const NORM_EPSILON: f64 = 1e-10;

/// Outcome of [`VectorStore::remove`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Removed {
	/// Slot that was freed (and possibly refilled).
	pub index: usize,
	/// Former index of the row that was moved into `index`, if any.
	pub moved: Option<usize>,
}

/// Dense storage of named vectors.
#[derive(Clone, Debug)]
pub struct VectorStore {
	dim: usize,
	rows: Array2<f64>,
	len: usize,
	names: Vec<String>,
	/// Insertion sequence per slot, used for stable tie-breaking.
	sequence: Vec<u64>,
	next_sequence: u64,
	index: HashMap<String, usize>,
}

impl VectorStore {
	/// Create an empty store for vectors of dimension `dim`.
	///
	/// # Errors
	///
	/// Returns [`CoreError::InvalidArgument`] if `dim` is zero.
	pub fn new(dim: usize, initial_capacity: usize) -> Result<Self> {
		if dim == 0 {
			return Err(CoreError::invalid("vector dimension must be positive"));
		}
		let capacity = initial_capacity.max(1);
		Ok(Self {
			dim,
			rows: Array2::zeros((capacity, dim)),
			len: 0,
			names: Vec::with_capacity(capacity),
			sequence: Vec::with_capacity(capacity),
			next_sequence: 0,
			index: HashMap::with_capacity(capacity),
		})
	}

	/// Vector dimension.
	#[must_use]
	pub const fn dim(&self) -> usize {
		self.dim
	}

	/// Number of live rows.
	#[must_use]
	pub const fn len(&self) -> usize {
		self.len
	}

	/// Whether the store holds no rows.
	#[must_use]
	pub const fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Number of rows the backing matrix can hold before growing.
	#[must_use]
	pub fn capacity(&self) -> usize {
		self.rows.nrows()
	}

	/// Whether `name` is stored.
	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.index.contains_key(name)
	}

	/// Index of `name`, if stored.
	#[must_use]
	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.index.get(name).copied()
	}

	/// Name stored at `index`, if live.
	#[must_use]
	pub fn name_of(&self, index: usize) -> Option<&str> {
		self.names.get(index).map(String::as_str)
	}

	/// Names in slot order.
	pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
		self.names.iter().map(String::as_str)
	}

	/// Row at `index`, if live.
	#[must_use]
	pub fn row(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
		(index < self.len).then(|| self.rows.row(index))
	}

	/// Vector stored under `name`.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] if the name is unknown.
	pub fn get(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
		let index = self
			.index_of(name)
			.ok_or_else(|| CoreError::NotFound(name.to_string()))?;
		Ok(self.rows.row(index))
	}

	/// Append a vector under a new name, growing capacity if needed.
	///
	/// # Errors
	///
	/// Returns [`CoreError::DuplicateName`] if the name exists and
	/// [`CoreError::InvalidArgument`] for a wrong dimension or non-finite values.
	pub fn add(&mut self, name: &str, vector: &[f64]) -> Result<usize> {
		if self.contains(name) {
			return Err(CoreError::DuplicateName(name.to_string()));
		}
		self.check_vector(vector)?;

		if self.len == self.capacity() {
			self.grow();
		}

		let index = self.len;
		self.rows.row_mut(index).assign(&ArrayView1::from(vector));
		self.names.push(name.to_string());
		self.sequence.push(self.next_sequence);
		self.next_sequence += 1;
		let _ = self.index.insert(name.to_string(), index);
		self.len += 1;
		Ok(index)
	}

	/// Overwrite the vector stored under `name`.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] for unknown names and
	/// [`CoreError::InvalidArgument`] for a wrong dimension or non-finite values.
	pub fn set(&mut self, name: &str, vector: &[f64]) -> Result<()> {
		let index = self
			.index_of(name)
			.ok_or_else(|| CoreError::NotFound(name.to_string()))?;
		self.check_vector(vector)?;
		self.rows.row_mut(index).assign(&ArrayView1::from(vector));
		Ok(())
	}

	/// Remove `name`, moving the last live row into its slot.
	///
	/// # Errors
	///
	/// Returns [`CoreError::NotFound`] if the name is unknown.
	pub fn remove(&mut self, name: &str) -> Result<Removed> {
		let index = self
			.index
			.remove(name)
			.ok_or_else(|| CoreError::NotFound(name.to_string()))?;
		let last = self.len - 1;

		let moved = if index == last {
			None
		} else {
			let tail = self.rows.row(last).to_owned();
			self.rows.row_mut(index).assign(&tail);
			let _ = self.index.insert(self.names[last].clone(), index);
			Some(last)
		};

		self.rows.row_mut(last).fill(0.0);
		let _ = self.names.swap_remove(index);
		let _ = self.sequence.swap_remove(index);
		self.len -= 1;

		Ok(Removed { index, moved })
	}

	/// Up to `k` stored names most similar to `query`, most similar first.
	///
	/// Ties keep insertion order. `exclude` drops one name from the results.
	/// Returns an empty list for an empty store, a dimension mismatch or a
	/// (near) zero query.
	#[must_use]
	pub fn nearest(&self, query: &[f64], k: usize, exclude: Option<&str>) -> Vec<(String, f64)> {
		if self.len == 0 || k == 0 || query.len() != self.dim {
			return Vec::new();
		}

		let query = ArrayView1::from(query);
		let query_norm = query.dot(&query).sqrt();
		if query_norm.is_nan() || query_norm < NORM_EPSILON {
			return Vec::new();
		}

		let mut scored: Vec<(usize, f64)> = (0..self.len)
			.filter(|&i| exclude != Some(self.names[i].as_str()))
			.filter_map(|i| {
				let row = self.rows.row(i);
				let row_norm = row.dot(&row).sqrt();
				(row_norm >= NORM_EPSILON).then(|| (i, row.dot(&query) / (query_norm * row_norm)))
			})
			.collect();

		scored.sort_by(|a, b| {
			b.1.total_cmp(&a.1)
				.then_with(|| self.sequence[a.0].cmp(&self.sequence[b.0]))
		});
		scored.truncate(k);

		scored
			.into_iter()
			.map(|(i, similarity)| (self.names[i].clone(), similarity))
			.collect()
	}

	fn check_vector(&self, vector: &[f64]) -> Result<()> {
		if vector.len() != self.dim {
			return Err(CoreError::invalid(format!(
				"expected vector of dimension {}, got {}",
				self.dim,
				vector.len()
			)));
		}
		if vector.iter().any(|x| !x.is_finite()) {
			return Err(CoreError::invalid("vector contains non-finite values"));
		}
		Ok(())
	}

	fn grow(&mut self) {
		let capacity = self.capacity() * 2;
		let mut rows = Array2::zeros((capacity, self.dim));
		rows.slice_mut(s![..self.len, ..])
			.assign(&self.rows.slice(s![..self.len, ..]));
		self.rows = rows;
		tracing::debug!(capacity, "vector store grew");
	}
}

/// Cosine similarity between two vectors.
///
/// Returns 0 for mismatched lengths or when either norm is below
/// [`NORM_EPSILON`].
#[inline]
#[must_use]
pub fn cosine_similarity(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
	if a.len() != b.len() {
		return 0.0;
	}

	let (dot_product, norm_a, norm_b) = a
		.iter()
		.zip(b.iter())
		.fold((0.0, 0.0, 0.0), |(dot, na, nb), (&ai, &bi)| {
			(ai.mul_add(bi, dot), ai.mul_add(ai, na), bi.mul_add(bi, nb))
		});

	let magnitude = norm_a.sqrt() * norm_b.sqrt();
	if magnitude < NORM_EPSILON {
		0.0
	} else {
		dot_product / magnitude
	}
}
