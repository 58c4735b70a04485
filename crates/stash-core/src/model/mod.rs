//! Domain models for the demo resources.
//!
//! - [`todo`]: the dummyjson todo API payloads
//! - [`meal`]: TheMealDB payloads and their validated, display-ready form
//! - [`employee`]: the fabricated employee directory

pub mod employee;
pub mod meal;
pub mod todo;

pub use employee::{Address, NewPerson, Person, PersonPatch};
pub use meal::{Ingredient, Meal, MealResponse, RawMeal, validate_meal_id};
pub use todo::{CreateTodoRequest, DeleteTodoResponse, Todo, TodosResponse, UpdateTodoRequest};
