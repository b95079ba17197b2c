//! Generated validation cases.
//!
//! Every case carries the container and the verdict a conforming parser
//! reaches on it. Generation is deterministic and never fails.

mod containers;
mod immediates;
mod rjump;
mod terminating;

use bytes::Bytes;

use crate::{Bytecode, Container, EofException, Section};

/// One named container with its expected verdict.
#[derive(Clone, Debug)]
pub struct TestCase {
	pub name: String,
	pub container: Container,
}

impl TestCase {
	pub fn new(name: impl Into<String>, container: Container) -> Self {
		let name = name.into();
		Self {
			container: container.named(name.clone()),
			name,
		}
	}

	pub fn valid(name: impl Into<String>, container: Container) -> Self {
		Self::new(name, container)
	}

	pub fn invalid(name: impl Into<String>, container: Container, error: EofException) -> Self {
		Self::new(name, container.expect(error))
	}

	/// Expected error, `None` if the container is valid.
	pub fn expected(&self) -> Option<EofException> {
		self.container.validity_error()
	}

	pub fn bytes(&self) -> &Bytes {
		self.container.serialize()
	}
}

/// Entry code section: no inputs and no outputs, max stack height computed.
pub(crate) fn entry_section(code: impl Into<Bytecode>) -> Section {
	Section::code(code).with_inputs(0).with_outputs(0)
}

/// Container with `code` as its only, entry, section.
pub(crate) fn entry_container(code: impl Into<Bytecode>) -> Container {
	Container::new(vec![entry_section(code)])
}

/// Cases for terminating and non-terminating last instructions.
pub fn terminating() -> Vec<TestCase> {
	terminating::cases()
}

/// Cases for truncated immediates and jumps into immediate data.
pub fn immediates() -> Vec<TestCase> {
	immediates::cases()
}

/// Cases for relative jumps and jump tables.
pub fn rjump() -> Vec<TestCase> {
	rjump::cases()
}

/// Cases for the container layout.
pub fn containers() -> Vec<TestCase> {
	containers::cases()
}

/// Every group with its name, in a fixed order.
pub fn groups() -> Vec<(&'static str, Vec<TestCase>)> {
	let groups = vec![
		("terminating", terminating()),
		("immediates", immediates()),
		("rjump", rjump()),
		("containers", containers()),
	];
	for (group, cases) in &groups {
		log::debug!(target: "eof", "generated {} {} cases", cases.len(), group);
	}
	groups
}

/// Every case, groups in a fixed order.
pub fn all() -> Vec<TestCase> {
	groups().into_iter().flat_map(|(_, cases)| cases).collect()
}
