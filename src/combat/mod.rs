pub mod conditions;
pub mod damage;
