pub mod task_name;
