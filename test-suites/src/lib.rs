pub mod assertions;
pub mod test_fixture;

pub use test_fixture::create_fixture_with_data;
